use regex::Regex;
use thiserror::Error;

static SHORT_IDENTIFIER_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^lb-[0-9]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("PID {pid} does not end in an identifier of the form lb-<number>")]
pub struct IdentifierFormatError {
    pub pid: String,
}

/// The `lb-<number>` part of a PID, used as the record key by COMEDI.
pub fn short_identifier(pid: &str) -> Result<&str, IdentifierFormatError> {
    let tail = pid.rsplit_once(':').map_or(pid, |(_, tail)| tail);
    if SHORT_IDENTIFIER_REGEX.is_match(tail) {
        Ok(tail)
    } else {
        Err(IdentifierFormatError {
            pid: pid.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_urn() {
        assert_eq!(
            short_identifier("urn:nbn:fi:lb-2020010100"),
            Ok("lb-2020010100")
        );
    }

    #[test]
    fn test_without_colon() {
        assert_eq!(short_identifier("lb-1"), Ok("lb-1"));
    }

    #[rstest]
    #[case("urn:nbn:fi:lb-20200101x")]
    #[case("urn:nbn:fi:lb-")]
    #[case("urn:nbn:fi:lb-abc")]
    #[case("urn:nbn:fi:lb-2020:")]
    #[case("urn:nbn:fi:xx-2020010100")]
    fn test_bad_suffix(#[case] pid: &str) {
        assert_eq!(
            short_identifier(pid),
            Err(IdentifierFormatError {
                pid: pid.to_string()
            })
        );
    }
}
