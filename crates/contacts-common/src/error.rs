use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad yaml".into());
        assert_eq!(e.to_string(), "configuration error: bad yaml");

        let e = Error::Migration("002_add_index.sql failed".into());
        assert_eq!(e.to_string(), "migration error: 002_add_index.sql failed");

        let e = Error::Validation("name is required".into());
        assert_eq!(e.to_string(), "validation error: name is required");

        let e = Error::NotFound("contact".into());
        assert_eq!(e.to_string(), "not found: contact");
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn read_missing() -> super::Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.sql")?)
        }

        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
