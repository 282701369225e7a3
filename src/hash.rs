
// FNV-1a over raw bytes. Every byte enters the accumulator as an unsigned value
// so the output is identical on every platform, the serialized dictionary and
// every bucketed feature id depend on it.

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

pub fn hash(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET, |h, b| (h ^ *b as u32).wrapping_mul(FNV_PRIME))
}
