//! Composite keys of the form `\0namespace\0part\0part\0`

use crate::shared::errors::StateError;

const DELIMITER: char = '\u{0}';

/// Build the key for `namespace` and every component
pub fn composite_key<S: AsRef<str>>(namespace: &str, components: &[S]) -> Result<String, StateError> {
    partial_composite_key(namespace, components)
}

/// Prefix shared by every key in `namespace` whose leading components match
pub fn partial_composite_key<S: AsRef<str>>(
    namespace: &str,
    components: &[S],
) -> Result<String, StateError> {
    validate(namespace)?;
    let mut key = String::with_capacity(namespace.len() + 2);
    key.push(DELIMITER);
    key.push_str(namespace);
    key.push(DELIMITER);
    for component in components {
        let component = component.as_ref();
        validate(component)?;
        key.push_str(component);
        key.push(DELIMITER);
    }
    Ok(key)
}

fn validate(part: &str) -> Result<(), StateError> {
    if part.contains(DELIMITER) {
        return Err(StateError::InvalidKey(part.replace(DELIMITER, "\\0")));
    }
    Ok(())
}
