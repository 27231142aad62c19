use std::fmt::Debug;

// This trait should be usable on any Result whose error can be printed, notably eyre reports
pub trait ForwardRefToTracing<T> {
    fn trace_err_ok(self) -> Option<T>;
}

impl<T, E> ForwardRefToTracing<T> for Result<T, E>
where
    E: Debug,
{
    fn trace_err_ok(self) -> Option<T> {
        self.inspect_err(|e| tracing::error!("{:?}", e)).ok()
    }
}

/// Something that owns a remote connection and can close it.
///
/// Takes `self` so a handle can only ever be released once.
pub trait Terminate {
    async fn terminate(self);
}
