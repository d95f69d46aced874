//! Payment references have the form
//!
//! ```text
//!    PLAN-{subject}-{YYYYMMDD}-{suffix}
//! ```
//!
//! where `subject` is the plan id (reduced to ASCII alphanumerics, `-` and `_`, at most 24 characters), the date is the
//! UTC checkout date and `suffix` is six random characters from an alphabet without look-alike glyphs. The reference
//! is visible to payers on the processor's checkout page and receipts, so it should be readable.
//!
//! Uniqueness is ultimately enforced by the `payment_intents` unique index. The random suffix keeps collisions rare
//! enough that a retry is practically never needed.
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db_types::Reference;

pub const REFERENCE_PREFIX: &str = "PLAN";
const SUFFIX_ALPHABET: [char; 32] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', '2', '3', '4', '5', '6', '7', '8', '9',
];
const SUFFIX_LEN: usize = 6;
const MAX_SUBJECT_LEN: usize = 24;

pub fn new_reference(subject_id: &str, now: DateTime<Utc>) -> Reference {
    let mut subject =
        subject_id.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_').collect::<String>();
    subject.truncate(MAX_SUBJECT_LEN);
    if subject.is_empty() {
        subject.push('x');
    }
    let mut rng = rand::thread_rng();
    let suffix = (0..SUFFIX_LEN).map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]).collect::<String>();
    Reference(format!("{REFERENCE_PREFIX}-{subject}-{}-{suffix}", now.format("%Y%m%d")))
}
