//! French spelling of receipt amounts.

const UNITS: [&str; 10] = [
    "", "un", "deux", "trois", "quatre", "cinq", "six", "sept", "huit", "neuf",
];
const TENS: [&str; 10] = [
    "",
    "",
    "vingt",
    "trente",
    "quarante",
    "cinquante",
    "soixante",
    "soixante-dix",
    "quatre-vingt",
    "quatre-vingt-dix",
];
const TEENS: [&str; 10] = [
    "dix", "onze", "douze", "treize", "quatorze", "quinze", "seize", "dix-sept", "dix-huit",
    "dix-neuf",
];

/// Spells `amount` in French, after rounding to the nearest integer.
///
/// Cents are not spelled out. Amounts of one million and above are returned as
/// plain numerals. Tens ending in one are joined with a hyphen only
/// (`"vingt-un"`, not `"vingt-et-un"`); printed receipts already use that form.
pub fn wordify(amount: f64) -> String {
    let rounded = amount.round();
    if !rounded.is_finite() || rounded < 0.0 {
        return format!("{rounded}");
    }
    spell(rounded as u64)
}

fn spell(n: u64) -> String {
    match n {
        0 => "zéro".to_string(),
        1..=9 => UNITS[n as usize].to_string(),
        10..=19 => TEENS[(n - 10) as usize].to_string(),
        20..=99 => {
            let (ten, unit) = ((n / 10) as usize, (n % 10) as usize);
            match (ten, unit) {
                (7, 1..=9) => format!("soixante-{}", TEENS[unit]),
                (9, 1..=9) => format!("quatre-vingt-{}", TEENS[unit]),
                (_, 0) => TENS[ten].to_string(),
                _ => format!("{}-{}", TENS[ten], UNITS[unit]),
            }
        }
        100..=999 => {
            let (hundred, rest) = (n / 100, n % 100);
            let mut words = if hundred == 1 {
                "cent".to_string()
            } else {
                format!("{} cent", UNITS[hundred as usize])
            };
            if hundred > 1 && rest == 0 {
                words.push('s');
            }
            if rest > 0 {
                words.push(' ');
                words.push_str(&spell(rest));
            }
            words
        }
        1_000..=999_999 => {
            let (thousand, rest) = (n / 1_000, n % 1_000);
            let mut words = if thousand == 1 {
                "mille".to_string()
            } else {
                format!("{} mille", spell(thousand))
            };
            if rest > 0 {
                words.push(' ');
                words.push_str(&spell(rest));
            }
            words
        }
        _ => n.to_string(),
    }
}
