//! Admin user identifier

use kernel::id::{Id, markers};

pub type UserId = Id<markers::User>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_uuid() {
        let id = UserId::from_u128(0x2a);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("00000000-0000-0000-0000-00000000002a"));
    }
}
