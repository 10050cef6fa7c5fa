use std::fmt::Debug;
use std::fmt::Display;

/// Convert an arbitrary error type into `actix_web::Error` with HTTP 500.
pub fn error_500<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}

/// Convert an arbitrary error type into `actix_web::Error` with HTTP 400.
pub fn error_400<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorBadRequest(e)
}

/// Convert an arbitrary error type into `actix_web::Error` with HTTP 404.
pub fn error_404<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorNotFound(e)
}

/// Convert an arbitrary error type into `actix_web::Error` with HTTP 409.
pub fn error_409<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorConflict(e)
}

/// Render an error together with its full `source()` chain, one cause per
/// line. Used by `Debug` impls of error enums so logs show every cause
/// instead of just the top frame.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
