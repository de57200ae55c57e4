/// Compare an API key in constant time.
///
/// XOR-folds the byte pairs so the comparison cost does not depend on where
/// the first mismatch sits.
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
