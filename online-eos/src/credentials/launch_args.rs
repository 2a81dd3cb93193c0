//! Launch argument lookup.

use std::collections::HashMap;

/// Key/value view over process launch arguments.
///
/// Keys are matched case-insensitively and may be written `-KEY=value`,
/// `-KEY value` or with a double dash. Later occurrences win. Arguments that
/// are not options are ignored.
#[derive(Debug, Clone, Default)]
pub struct LaunchArgs {
    values: HashMap<String, String>,
}

impl LaunchArgs {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let mut values = HashMap::new();
        let mut iter = args.iter().map(|arg| arg.as_ref()).peekable();

        while let Some(arg) = iter.next() {
            let Some(option) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
                continue;
            };
            if option.is_empty() {
                continue;
            }

            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key, value.to_string()),
                None => match iter.peek() {
                    Some(next) if !next.starts_with('-') => {
                        let value = next.to_string();
                        iter.next();
                        (option, value)
                    }
                    _ => (option, String::new()),
                },
            };
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_ascii_uppercase(), value);
        }

        Self { values }
    }

    /// Value of `key`; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["-AUTH_PASSWORD=abc123"], Some("abc123"))]
    #[case(&["-auth_password", "abc123"], Some("abc123"))]
    #[case(&["--Auth_Password=abc123"], Some("abc123"))]
    #[case(&["-AUTH_PASSWORD="], None)]
    #[case(&["-AUTH_PASSWORD", "-AUTH_TYPE=exchangecode"], None)]
    #[case(&["game.exe", "AUTH_PASSWORD=abc123"], None)]
    #[case(&["-AUTH_PASSWORD=first", "-AUTH_PASSWORD=second"], Some("second"))]
    fn test_lookup(#[case] args: &[&str], #[case] expected: Option<&str>) {
        let parsed = LaunchArgs::parse(args);
        assert_eq!(parsed.get("AUTH_PASSWORD"), expected);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let parsed = LaunchArgs::parse(&["-epicsandboxid=a=b"]);
        assert_eq!(parsed.get("EPICSANDBOXID"), Some("a=b"));
    }

    #[test]
    fn test_flags_without_value() {
        let parsed = LaunchArgs::parse(&["-nosplash", "-AUTH_TYPE", "developer"]);
        assert!(parsed.contains("nosplash"));
        assert_eq!(parsed.get("nosplash"), None);
        assert_eq!(parsed.get("auth_type"), Some("developer"));
    }
}
