// Deterministic payload generation for the bench suite; no dataset on disk,
// codes are built in memory.

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 .,:;?!";

pub fn payloads(count: usize, len: usize) -> Vec<String> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|_| {
            (0..len)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    CHARSET[(state % CHARSET.len() as u64) as usize] as char
                })
                .collect()
        })
        .collect()
}
