use crate::domain::errors::GraftError;
use crate::domain::models::JsonOut;
use serde::Serialize;

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

/// Prints a single result. `ok` is false for reports that describe a failure,
/// e.g. a configuration with errors, which the caller then exits non-zero on.
pub fn print_report<T: Serialize>(
    json: bool,
    ok: bool,
    data: T,
    render: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&JsonOut { ok, data })?);
    } else {
        println!("{}", render(&data));
    }
    Ok(())
}

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    render: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    print_report(json, true, data, render)
}

pub fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<GraftError>()
        .map(GraftError::code)
        .unwrap_or("INTERNAL")
}

/// Errors go to stdout as an envelope in JSON mode so callers parse one stream.
pub fn print_error(json: bool, err: &anyhow::Error) {
    if json {
        let envelope = serde_json::json!({
            "ok": false,
            "error": {
                "code": error_code(err),
                "message": format!("{:#}", err),
            }
        });
        println!("{}", envelope);
    } else {
        eprintln!("error: {:#}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn domain_errors_keep_their_code_through_anyhow() {
        let err = anyhow::Error::new(GraftError::StubMissing(PathBuf::from("pkg/report.py")));
        assert_eq!(error_code(&err), "STUB_MISSING");
        assert_eq!(error_code(&anyhow::anyhow!("boom")), "INTERNAL");
    }
}
