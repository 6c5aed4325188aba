use rand::{distributions::Uniform, Rng};

pub const INVOICE_CODE_LEN: usize = 8;
pub const TRANSACTION_CODE_LEN: usize = 12;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_code(len: usize) -> String {
    let dist = Uniform::new(0, ALPHABET.len());
    rand::thread_rng().sample_iter(dist).take(len).map(|i| ALPHABET[i] as char).collect()
}

/// Generates a new 8-character invoice code. Codes are uppercase alphanumeric and only need to be
/// unique within a single merchant's invoice collection; callers handle the (rare) collision by
/// regenerating.
pub fn new_invoice_code() -> String {
    random_code(INVOICE_CODE_LEN)
}

/// Generates a new 12-character transaction code, used as the ledger key for purchases and
/// withdrawals and as the client reference on off-ramp orders.
pub fn new_transaction_code() -> String {
    random_code(TRANSACTION_CODE_LEN)
}
