//! Position decomposition.
//!
//! A published position is one or two role codes: `"DF"`, `"MF,FW"`. The
//! first code is the primary role, the second (if any) the secondary.

use crate::errors::HarvestError;
use crate::models::{PositionDescriptor, Role, SecondaryRole};

/// Split a position code into primary and secondary roles.
///
/// Every token must belong to the role vocabulary; anything else is a
/// [`HarvestError::Vocabulary`] naming the offending token.
pub fn decompose(code: &str) -> Result<PositionDescriptor, HarvestError> {
    let mut tokens = code.split(',').map(str::trim);
    let role = |token: &str| {
        Role::from_code(token).ok_or_else(|| HarvestError::Vocabulary {
            code: code.to_string(),
            token: token.to_string(),
        })
    };

    let primary = role(tokens.next().unwrap_or_default())?;
    let secondary = match tokens.next() {
        None | Some("") => SecondaryRole::None,
        Some(token) => SecondaryRole::Role(role(token)?),
    };
    if let Some(extra) = tokens.next() {
        return Err(HarvestError::Vocabulary {
            code: code.to_string(),
            token: extra.to_string(),
        });
    }

    Ok(PositionDescriptor { primary, secondary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_roles() {
        let d = decompose("MF,FW").unwrap();
        assert_eq!(d.primary, Role::Midfielder);
        assert_eq!(d.secondary, SecondaryRole::Role(Role::Forward));
    }

    #[test]
    fn test_single_role_has_explicit_no_secondary() {
        let d = decompose("DF").unwrap();
        assert_eq!(d.primary, Role::Defender);
        assert_eq!(d.secondary, SecondaryRole::None);

        assert_eq!(decompose(" GK ").unwrap().primary, Role::Goalkeeper);
    }

    #[test]
    fn test_unknown_tokens_are_rejected() {
        match decompose("XX") {
            Err(HarvestError::Vocabulary { code, token }) => {
                assert_eq!(code, "XX");
                assert_eq!(token, "XX");
            }
            other => panic!("expected vocabulary error, got {other:?}"),
        }
        assert!(matches!(
            decompose("FW,WB"),
            Err(HarvestError::Vocabulary { token, .. }) if token == "WB"
        ));
        assert!(decompose("").is_err());
        assert!(decompose("DF,MF,FW").is_err());
    }
}
