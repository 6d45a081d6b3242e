use rand::Rng;

/// Words a recovery passphrase is sampled from.
pub const WORDLIST: [&str; 56] = [
    "abandon", "ability", "able", "about", "above", "absent", "absorb", "abstract", "absurd",
    "abuse", "access", "accident", "account", "accuse", "achieve", "acid", "acoustic", "acquire",
    "across", "act", "action", "actor", "actress", "actual", "adapt", "add", "addict", "address",
    "adjust", "admit", "adult", "advance", "advice", "aerobic", "affair", "afford", "afraid",
    "again", "against", "age", "agent", "agree", "ahead", "aim", "air", "airport", "aisle",
    "alarm", "album", "alcohol", "alert", "alien", "all", "alley", "allow", "almost",
];

/// Number of words in a generated passphrase.
pub const PASSPHRASE_WORDS: usize = 12;

/// Generate a 12-word recovery passphrase. Words may repeat; the phrase is
/// only a human-friendly lookup handle, not key material.
pub fn generate_passphrase() -> String {
    let mut rng = rand::thread_rng();
    let mut words = Vec::with_capacity(PASSPHRASE_WORDS);
    for _ in 0..PASSPHRASE_WORDS {
        words.push(WORDLIST[rng.gen_range(0..WORDLIST.len())]);
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_has_twelve_known_words() {
        let phrase = generate_passphrase();
        let words: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(words.len(), PASSPHRASE_WORDS);
        for word in words {
            assert!(WORDLIST.contains(&word), "unexpected word: {word}");
        }
    }

    #[test]
    fn passphrases_differ_between_calls() {
        // 56^12 combinations make a collision in two draws vanishingly unlikely
        let a = generate_passphrase();
        let b = generate_passphrase();
        assert_ne!(a, b);
    }
}
