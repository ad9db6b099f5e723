//! Outbound command encoding
//!
//! The station accepts AT-style commands of the form
//! `AT+SEND=0,<payload_length>,<body>`. The body is either
//! `<register>-<key>` to assign a key, or `remove <register>` to delete
//! one. Encoding is pure; the caller sends the result over the link and
//! updates the register store itself.

/// Command assigning `key` to register `name`. The payload length counts
/// the key, the register name, and the `-` separator between them. An
/// empty key is legal and yields a body with a trailing separator.
pub fn encode_upsert(name: &str, key: &str) -> String {
    let payload_length = key.len() + name.len() + 1;
    format!("AT+SEND=0,{},{}-{}", payload_length, name, key)
}

/// Command deleting the key held by register `name`. The station firmware
/// expects the payload length to be `len(name) + 7` here, which is what
/// the deployed stations have always been sent. Do not recompute it from
/// the body; wire compatibility takes precedence.
pub fn encode_delete(name: &str) -> String {
    let payload_length = name.len() + 7;
    format!("AT+SEND=0,{},remove {}", payload_length, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reference_example() {
        // EXX + abc123: payload length 3 + 6 + 1
        assert_eq!(encode_upsert("EXX", "abc123"), "AT+SEND=0,10,EXX-abc123");
    }

    #[test]
    fn delete_reference_example() {
        assert_eq!(encode_delete("EYX"), "AT+SEND=0,10,remove EYX");
    }

    #[test]
    fn upsert_with_empty_key_keeps_separator() {
        assert_eq!(encode_upsert("EZX", ""), "AT+SEND=0,4,EZX-");
    }

    #[test]
    fn upsert_payload_length_matches_body() {
        for (name, key) in [("EXX", "a"), ("EYX", "longer key with spaces"), ("Z", "")] {
            let cmd = encode_upsert(name, key);
            let mut fields = cmd.splitn(3, ',');
            assert_eq!(fields.next(), Some("AT+SEND=0"));
            let length: usize = fields.next().unwrap().parse().unwrap();
            let body = fields.next().unwrap();
            assert_eq!(length, body.len());
            assert_eq!(body, format!("{}-{}", name, key));
        }
    }

    #[test]
    fn delete_payload_length_formula() {
        for name in ["EXX", "A", "LONGNAME"] {
            let cmd = encode_delete(name);
            let mut fields = cmd.splitn(3, ',');
            assert_eq!(fields.next(), Some("AT+SEND=0"));
            let length: usize = fields.next().unwrap().parse().unwrap();
            let body = fields.next().unwrap();
            assert_eq!(length, name.len() + 7);
            assert_eq!(body, format!("remove {}", name));
        }
    }
}
