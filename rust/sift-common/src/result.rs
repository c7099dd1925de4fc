use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(Error::invalid_arg(name, condition))
    }
}

/// Like [`verify_arg`], but a failed check means the index file contradicts itself.
#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(Error::corrupt_index(name, condition))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_count(count: u32) -> super::Result<u32> {
        verify_data!(num_buckets, count > 0);
        Ok(count)
    }

    fn check_terms(terms: &[&str]) -> super::Result<usize> {
        verify_arg!(terms, !terms.is_empty());
        Ok(terms.len())
    }

    #[test]
    fn test_verify_data() {
        assert_eq!(check_count(3).unwrap(), 3);
        let err = check_count(0).unwrap_err();
        match err.kind() {
            ErrorKind::CorruptIndex { element, message } => {
                assert_eq!(element, "num_buckets");
                assert_eq!(message, "count > 0");
            }
            other => panic!("unexpected error kind {other:?}"),
        }
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check_terms(&["a"]).unwrap(), 1);
        let err = check_terms(&[]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert_eq!(err.to_string(), "invalid argument terms: !terms.is_empty()");
    }
}
