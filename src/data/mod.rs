use crate::core::Notes;
use anyhow::Result;
use serde::Serialize;
use std::io::BufRead;

mod gen;
mod run;

pub use gen::*;
pub use run::*;

/// Reads notes from the reader.
///
/// # Errors
/// - If the reader fails or the notes are malformed.
pub fn deserialize(reader: &mut impl BufRead) -> Result<Notes> {
    let mut buffer = String::new();
    std::io::Read::read_to_string(reader, &mut buffer)?;
    Ok(buffer.parse()?)
}

/// Serializes the value to YAML.
///
/// # Errors
/// - If the value cannot be serialized.
pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::ParseError;

    #[test]
    fn notes_should_deserialize() -> Result<()> {
        let mut reader = std::io::Cursor::new("939\n7,13,x,x,59,x,31,19\n");
        let notes = deserialize(&mut reader)?;
        assert_eq!(notes.earliest, Some(939));
        assert_eq!(notes.schedule.to_string(), "7,13,x,x,59,x,31,19");
        Ok(())
    }

    #[test]
    fn malformed_notes_report_token() {
        let mut reader = std::io::Cursor::new("939\n7,13,?,59\n");
        let err = deserialize(&mut reader).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ParseError>(),
            Some(&ParseError::InvalidToken {
                token: "?".into(),
                position: 2
            })
        );
    }

    #[test]
    fn notes_should_serialize() -> Result<()> {
        let notes: Notes = "939\n7,13,x,x,59,x,31,19".parse()?;
        let serialized = to_string(&notes)?;
        let deserialized: Notes = serde_yaml::from_str(&serialized)?;
        assert_eq!(notes, deserialized);
        Ok(())
    }
}
