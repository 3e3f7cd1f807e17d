use crate::path::Path;
use crate::value::Value;

/// The ordered stack of scopes a parse tree is rendered against. Scope 0
/// (the last element) is innermost; lookups walk innermost to outermost.
///
/// Represented as a contiguous `Vec<Value>` rather than a parent-pointer
/// graph (design note: "context stack as arena, not pointer graph"):
/// `push`/`pop` are simple append/truncate operations.
pub struct Context {
    scopes: Vec<Value>,
}

/// Pops the pushed scope when dropped, even if the closure given to
/// [`Context::scoped`] panics. This is the "scoped acquisition pattern"
/// the render engine relies on to keep pushes and pops paired on every
/// exit path, including an early `?`-propagated render error.
struct PopGuard<'a> {
    context: &'a mut Context,
}

impl Drop for PopGuard<'_> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

impl Context {
    /// Creates a context stack with a single root scope.
    pub fn new(root: Value) -> Self {
        Context { scopes: vec![root] }
    }

    /// Pushes a new innermost scope.
    pub fn push(&mut self, value: Value) {
        self.scopes.push(value);
    }

    /// Pops the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics if the stack has no scopes left to pop. A render invocation
    /// that calls this without a matching `push` is an internal invariant
    /// violation, not a recoverable error.
    pub fn pop(&mut self) {
        self.scopes.pop().expect("pop called on an empty context stack");
    }

    /// Runs `f` with `value` pushed as the innermost scope, popping it
    /// again once `f` returns (or panics).
    pub fn scoped<T>(&mut self, value: Value, f: impl FnOnce(&mut Context) -> T) -> T {
        self.push(value);
        let guard = PopGuard { context: self };
        f(guard.context)
    }

    /// The innermost scope's value, for resolving the special name `.`.
    pub fn top(&self) -> Value {
        self.scopes.last().cloned().unwrap_or(Value::Null)
    }

    /// Resolves a (possibly dotted) name per §4.2: the head segment is
    /// found by walking scopes innermost to outermost, selecting the first
    /// scope that *contains* the key (even if its value is falsy); any
    /// remaining segments navigate the resolved value as map lookups with
    /// no further stack fallback. Unresolved segments yield `Null`.
    pub fn lookup(&self, name: &str) -> Value {
        self.lookup_checked(name).unwrap_or(Value::Null)
    }

    /// As [`Context::lookup`], but distinguishes "resolved to nothing"
    /// (`Ok(Value::Null)`) from "tried to navigate `.segment` into a value
    /// that isn't a map" (`Err`). Lenient-mode callers can discard the
    /// distinction with `.unwrap_or(Value::Null)`; strict-mode callers
    /// surface the error as [`crate::error::RenderError::ContextTypeError`].
    pub fn lookup_checked(&self, name: &str) -> Result<Value, DottedTypeError> {
        if name == "." {
            return Ok(self.top());
        }
        let keys: Vec<&str> = name.split('.').collect();
        self.resolve(&keys)
    }

    /// As [`Context::lookup_checked`], but takes an already-validated
    /// [`Path`] instead of re-splitting a name string. The render engine
    /// uses this: the parser already split and validated the dotted name
    /// once, so there is no need to do it again on every render.
    pub fn lookup_path_checked(&self, path: &Path) -> Result<Value, DottedTypeError> {
        if path.is_dot() {
            return Ok(self.top());
        }
        let keys: Vec<&str> = path.keys.iter().map(String::as_str).collect();
        self.resolve(&keys)
    }

    /// As [`Context::lookup_path_checked`], discarding the type-mismatch
    /// distinction in favor of `Null`.
    pub fn lookup_path(&self, path: &Path) -> Value {
        self.lookup_path_checked(path).unwrap_or(Value::Null)
    }

    /// The shared head-then-segments walk behind both `lookup_checked` and
    /// `lookup_path_checked`.
    fn resolve(&self, keys: &[&str]) -> Result<Value, DottedTypeError> {
        let head = match keys.first() {
            Some(head) => *head,
            None => return Ok(Value::Null),
        };

        let mut value = self
            .scopes
            .iter()
            .rev()
            .find(|scope| scope.contains_key(head))
            .map(|scope| scope.get(head))
            .unwrap_or(Value::Null);

        for segment in &keys[1..] {
            match &value {
                Value::Null => return Ok(Value::Null),
                Value::Map(_) | Value::Host(_) => value = value.get(segment),
                _ => return Err(DottedTypeError),
            }
        }

        Ok(value)
    }
}

/// Signals that a dotted name tried to navigate `.segment` into a resolved
/// value that is neither `Null` (a plain miss) nor a map-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DottedTypeError;
