//! Random session and user identifiers.

use rand::Rng;

/// URL-safe base64 alphabet; ids never contain `|`, `;`, `,` or `=`.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub fn new_id(len: usize) -> String {
    new_id_with(&mut rand::thread_rng(), len)
}

/// Six bits per character, five characters per 32-bit draw.  The two bits
/// left over from each draw are carried into the next one.
pub fn new_id_with<R: Rng>(rng: &mut R, len: usize) -> String {
    let mut out = String::with_capacity(len);
    let mut number: u32 = rng.gen();
    let mut used = 0;
    while out.len() < len {
        out.push(ALPHABET[(number & 0x3f) as usize] as char);
        number >>= 6;
        used += 1;
        if used == 5 {
            number = (rng.gen::<u32>() << 2) | (number & 0x3);
            used = 0;
        }
    }
    out
}
