//! Prefixed, human-scannable identifiers.
//!
//! Format: `<PREFIX>-XXXXX-XXXXX`, where each `X` is drawn uniformly from
//! [`ID_ALPHABET`] (digits and uppercase letters without `I` and `O`).
//! Uniqueness is probabilistic: 34^10 possible suffixes per prefix.

use rand::Rng;

/// Symbols used in identifier suffixes.
pub const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Prefix for patient identifiers.
pub const PATIENT_PREFIX: &str = "PAT";

/// Prefix for medical-history record identifiers.
pub const RECORD_PREFIX: &str = "REC";

const SUFFIX_LEN: usize = 10;
const GROUP_LEN: usize = 5;

/// Generator for identifiers sharing one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    prefix: &'static str,
}

/// Generator for `PAT-` identifiers.
pub const PATIENT_IDS: IdGenerator = IdGenerator::new(PATIENT_PREFIX);

/// Generator for `REC-` identifiers.
pub const RECORD_IDS: IdGenerator = IdGenerator::new(RECORD_PREFIX);

impl IdGenerator {
    /// Create a generator for the given prefix.
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    /// The prefix this generator stamps on every identifier.
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Produce a fresh identifier.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut id = String::with_capacity(self.prefix.len() + SUFFIX_LEN + 2);
        id.push_str(self.prefix);

        for i in 0..SUFFIX_LEN {
            if i % GROUP_LEN == 0 {
                id.push('-');
            }
            let symbol = ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())];
            id.push(symbol as char);
        }

        id
    }

    /// Check that `candidate` is a well-formed identifier with this prefix.
    pub fn is_valid(&self, candidate: &str) -> bool {
        is_valid_id(self.prefix, candidate)
    }
}

/// Build a closure that yields a fresh identifier on every call.
pub fn make_id_generator(prefix: &'static str) -> impl Fn() -> String {
    let generator = IdGenerator::new(prefix);
    move || generator.generate()
}

/// Check that `candidate` matches `<prefix>-XXXXX-XXXXX` over [`ID_ALPHABET`].
pub fn is_valid_id(prefix: &str, candidate: &str) -> bool {
    let Some(suffix) = candidate
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    let mut groups = suffix.split('-');
    match (groups.next(), groups.next(), groups.next()) {
        (Some(first), Some(second), None) => is_group(first) && is_group(second),
        _ => false,
    }
}

fn is_group(group: &str) -> bool {
    group.len() == GROUP_LEN && group.bytes().all(|b| ID_ALPHABET.contains(&b))
}
