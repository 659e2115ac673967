//! Bob Jenkins' hash functions
//!
//! Two generations of the hash are in use:
//!
//! - [`jenkins_hash`] is lookup2 (1996), a 32-bit hash over 12-byte blocks
//!   that takes an explicit initial value so results can be chained.
//! - [`hashlittle`] and [`hashlittle2`] are lookup3 (2006). [`Jenkins96`]
//!   combines the two 32-bit outputs of `hashlittle2` into the 64-bit hash
//!   that root tables store for file paths.

use std::fmt;

const LOOKUP2_GOLDEN_RATIO: u32 = 0x9e37_79b9;
const LOOKUP3_SEED: u32 = 0xdead_beef;

/// Jenkins96 hash result containing both 64-bit and 32-bit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Jenkins96 {
    /// `(pc << 32) | pb` from `hashlittle2`
    pub hash64: u64,
    /// `pc` alone, equal to `hashlittle` of the same input
    pub hash32: u32,
}

impl Jenkins96 {
    /// Compute Jenkins96 hash of data
    pub fn hash(data: &[u8]) -> Self {
        let mut pc = 0u32;
        let mut pb = 0u32;
        hashlittle2(data, &mut pc, &mut pb);

        Self {
            hash64: (u64::from(pc) << 32) | u64::from(pb),
            hash32: pc,
        }
    }
}

impl fmt::Display for Jenkins96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}:{:08x}", self.hash64, self.hash32)
    }
}

/// lookup2 hash of `data` seeded with `initval`
///
/// Feeding a previous result back in as `initval` chains hashes across
/// several inputs.
///
/// ```
/// use casket_crypto::jenkins_hash;
///
/// let first = jenkins_hash(b"hello", 0);
/// assert_eq!(first, 3070638494);
/// assert_eq!(jenkins_hash(b"hello", first), 1535955511);
/// ```
pub fn jenkins_hash(data: &[u8], initval: u32) -> u32 {
    let mut a = LOOKUP2_GOLDEN_RATIO;
    let mut b = LOOKUP2_GOLDEN_RATIO;
    let mut c = initval;

    let mut blocks = data.chunks_exact(12);
    for block in &mut blocks {
        let [x, y, z] = words(block);
        a = a.wrapping_add(x);
        b = b.wrapping_add(y);
        c = c.wrapping_add(z);
        lookup2_mix(&mut a, &mut b, &mut c);
    }

    // The tail never fills a whole block, so the lowest byte of the third
    // word is reserved for the length.
    let [x, y, z] = words(blocks.remainder());
    c = c.wrapping_add(data.len() as u32);
    a = a.wrapping_add(x);
    b = b.wrapping_add(y);
    c = c.wrapping_add(z << 8);
    lookup2_mix(&mut a, &mut b, &mut c);
    c
}

/// lookup3 `hashlittle()`: single 32-bit hash
///
/// ```
/// use casket_crypto::hashlittle;
///
/// let hash = hashlittle(b"Four score and seven years ago", 0);
/// assert_eq!(format!("{hash:x}"), "17770551");
/// ```
pub fn hashlittle(data: &[u8], initval: u32) -> u32 {
    let mut pc = initval;
    let mut pb = 0;
    hashlittle2(data, &mut pc, &mut pb);
    pc
}

/// lookup3 `hashlittle2()`: two 32-bit hashes
///
/// `pc` and `pb` are seeds on input and results on output. With `pb == 0`
/// the value left in `pc` equals [`hashlittle`].
pub fn hashlittle2(data: &[u8], pc: &mut u32, pb: &mut u32) {
    let mut a = LOOKUP3_SEED
        .wrapping_add(data.len() as u32)
        .wrapping_add(*pc);
    let mut b = a;
    let mut c = a.wrapping_add(*pb);

    if data.is_empty() {
        *pc = c;
        *pb = b;
        return;
    }

    // All blocks but the last go through mix; the last one (1 to 12 bytes)
    // goes through the final mix.
    let tail_start = (data.len() - 1) / 12 * 12;
    for block in data[..tail_start].chunks_exact(12) {
        let [x, y, z] = words(block);
        a = a.wrapping_add(x);
        b = b.wrapping_add(y);
        c = c.wrapping_add(z);
        lookup3_mix(&mut a, &mut b, &mut c);
    }

    let [x, y, z] = words(&data[tail_start..]);
    a = a.wrapping_add(x);
    b = b.wrapping_add(y);
    c = c.wrapping_add(z);
    lookup3_final(&mut a, &mut b, &mut c);

    *pc = c;
    *pb = b;
}

/// Three little-endian words from up to 12 bytes, zero padded
fn words(block: &[u8]) -> [u32; 3] {
    let mut padded = [0u8; 12];
    padded[..block.len()].copy_from_slice(block);
    [
        u32::from_le_bytes([padded[0], padded[1], padded[2], padded[3]]),
        u32::from_le_bytes([padded[4], padded[5], padded[6], padded[7]]),
        u32::from_le_bytes([padded[8], padded[9], padded[10], padded[11]]),
    ]
}

fn lookup2_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 13);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 8);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 13);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 12);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 16);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 5);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 3);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 10);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 15);
}

fn lookup3_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c) ^ c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a) ^ a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b) ^ b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c) ^ c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a) ^ a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b) ^ b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn lookup3_final(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(14));
    *a = (*a ^ *c).wrapping_sub(c.rotate_left(11));
    *b = (*b ^ *a).wrapping_sub(a.rotate_left(25));
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(16));
    *a = (*a ^ *c).wrapping_sub(c.rotate_left(4));
    *b = (*b ^ *a).wrapping_sub(a.rotate_left(14));
    *c = (*c ^ *b).wrapping_sub(b.rotate_left(24));
}
