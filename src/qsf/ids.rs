use uuid::Uuid;

/// Width of the random part of every generated identifier.
const TOKEN_LEN: usize = 11;

/// Supplies the random part of generated identifiers.
pub trait TokenSource: Send {
    fn next_token(&mut self) -> String;
}

/// Tokens cut from v4 UUIDs.
#[derive(Debug, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&mut self) -> String {
        Uuid::new_v4().simple().to_string()[..TOKEN_LEN].to_string()
    }
}

/// Deterministic token stream for reproducible documents.
#[derive(Debug)]
pub struct SeededTokens {
    state: u64,
}

impl SeededTokens {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl TokenSource for SeededTokens {
    fn next_token(&mut self) -> String {
        // splitmix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        format!("{:x}", z)
    }
}

/// Question reference allocated by [`IdGenerator::next_question`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRef {
    pub id: String,  // QID1, QID2, ...
    pub tag: String, // Q1, Q2, ... used as the export column name
}

/// Allocates identifiers for one document. Owned by a single assembly run, never shared.
///
/// Every id is `PREFIX_<token><counter>` where the token is padded or cut to a fixed width
/// and the counter never repeats, so two ids from one generator can not collide whatever
/// the token source returns.
pub struct IdGenerator {
    tokens: Box<dyn TokenSource>,
    issued: u64,
    questions: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_source(RandomTokens)
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_source(SeededTokens::new(seed))
    }

    pub fn with_source(source: impl TokenSource + 'static) -> Self {
        Self {
            tokens: Box::new(source),
            issued: 0,
            questions: 0,
        }
    }

    pub fn new_id(&mut self, prefix: &str) -> String {
        self.issued += 1;
        let raw = self.tokens.next_token();
        format!(
            "{prefix}_{token:0>width$.width$}{counter:04X}",
            token = raw,
            width = TOKEN_LEN,
            counter = self.issued
        )
    }

    pub fn next_question(&mut self) -> QuestionRef {
        self.questions += 1;
        QuestionRef {
            id: format!("QID{}", self.questions),
            tag: format!("Q{}", self.questions),
        }
    }

    pub fn questions_issued(&self) -> u32 {
        self.questions
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("issued", &self.issued)
            .field("questions", &self.questions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct ConstantTokens;

    impl TokenSource for ConstantTokens {
        fn next_token(&mut self) -> String {
            "same".to_string()
        }
    }

    #[test]
    fn test_new_id_has_prefix_and_fixed_shape() {
        let mut ids = IdGenerator::new();
        let id = ids.new_id("BL");

        assert!(id.starts_with("BL_"));
        assert_eq!(id.len(), "BL_".len() + TOKEN_LEN + 4);
    }

    #[test]
    fn test_ids_stay_unique_even_when_tokens_repeat() {
        let mut ids = IdGenerator::with_source(ConstantTokens);
        let generated: HashSet<String> = (0..5000).map(|_| ids.new_id("FL")).collect();
        assert_eq!(generated.len(), 5000);
    }

    #[test]
    fn test_seeded_generators_repeat_the_same_sequence() {
        let mut a = IdGenerator::seeded(42);
        let mut b = IdGenerator::seeded(42);
        let first: Vec<String> = (0..10).map(|_| a.new_id("SV")).collect();
        let second: Vec<String> = (0..10).map(|_| b.new_id("SV")).collect();
        assert_eq!(first, second);

        let mut c = IdGenerator::seeded(43);
        assert_ne!(first[0], c.new_id("SV"));
    }

    #[test]
    fn test_question_refs_are_strictly_increasing() {
        let mut ids = IdGenerator::seeded(1);
        let q1 = ids.next_question();
        ids.new_id("BL");
        let q2 = ids.next_question();

        assert_eq!(q1.id, "QID1");
        assert_eq!(q1.tag, "Q1");
        assert_eq!(q2.id, "QID2");
        assert_eq!(q2.tag, "Q2");
        assert_eq!(ids.questions_issued(), 2);
    }
}
