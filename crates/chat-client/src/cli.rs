use thiserror::Error;

pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:8080/api/chat";
pub const CHAT_URL_ENV: &str = "KOA_CHAT_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("missing value for argument: {0}")]
    MissingValue(String),
    #[error("chat url must start with http:// or https://: {0}")]
    InvalidUrl(String),
    #[error("help requested")]
    HelpRequested,
}

impl CliOptions {
    /// `env_url` is the value of `KOA_CHAT_URL`, if set. `--url` wins over it.
    pub fn parse<I>(args: I, env_url: Option<String>) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut url = env_url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(CliError::HelpRequested),
                "--url" => {
                    let value = iter.next().ok_or(CliError::MissingValue(arg.clone()))?;
                    url = Some(value.trim().to_string());
                }
                unknown => return Err(CliError::UnknownArgument(unknown.to_string())),
            }
        }

        let url = url.unwrap_or_else(|| DEFAULT_CHAT_URL.to_string());
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CliError::InvalidUrl(url));
        }

        Ok(Self { url })
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, CliOptions, DEFAULT_CHAT_URL};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn defaults_to_local_server() {
        let options = CliOptions::parse(args(&[]), None).expect("parse");
        assert_eq!(options.url, DEFAULT_CHAT_URL);
    }

    #[test]
    fn flag_overrides_environment() {
        let options = CliOptions::parse(
            args(&["--url", "http://10.0.0.2:9000/api/chat"]),
            Some("http://env.local/api/chat".to_string()),
        )
        .expect("parse");
        assert_eq!(options.url, "http://10.0.0.2:9000/api/chat");

        let options =
            CliOptions::parse(args(&[]), Some(" https://koa.example/api/chat ".to_string()))
                .expect("parse");
        assert_eq!(options.url, "https://koa.example/api/chat");
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            CliOptions::parse(args(&["--url"]), None),
            Err(CliError::MissingValue(_))
        ));
        assert!(matches!(
            CliOptions::parse(args(&["--verbose"]), None),
            Err(CliError::UnknownArgument(_))
        ));
        assert!(matches!(
            CliOptions::parse(args(&["--url", "ftp://nope"]), None),
            Err(CliError::InvalidUrl(_))
        ));
        assert!(matches!(
            CliOptions::parse(args(&["-h"]), None),
            Err(CliError::HelpRequested)
        ));
    }
}
