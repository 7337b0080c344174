//! Output encodings for Braille cells.

use crate::config::BrailleEncoding;

/// North American ASCII Braille, indexed by dot pattern (bit i-1 = dot i).
const ASCII_BRAILLE: &[u8; 64] =
    b" A1B'K2L@CIF/MSP\"E3H9O6R^DJG>NTQ,*5<-U8V.%[$+X!&;:4\\0Z7(_?W]#Y)=";

/// Render Unicode Braille `cells` in the requested encoding.
///
/// Line breaks pass through untouched. Eight-dot cells have no ASCII form and
/// are rendered as blanks.
pub fn encode(cells: &str, encoding: BrailleEncoding) -> String {
    match encoding {
        BrailleEncoding::Unicode => cells.to_string(),
        BrailleEncoding::Ascii => cells.chars().map(to_ascii).collect(),
    }
}

fn to_ascii(ch: char) -> char {
    match u32::from(ch).checked_sub(0x2800) {
        Some(pattern) if pattern < 64 => ASCII_BRAILLE[pattern as usize] as char,
        Some(pattern) if pattern < 256 => ' ',
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_is_identity() {
        assert_eq!(encode("⠚⠒\n⠈⠍⠁", BrailleEncoding::Unicode), "⠚⠒\n⠈⠍⠁");
    }

    #[test]
    fn ascii_brf_letters_and_number_sign() {
        assert_eq!(encode("⠁⠃⠉", BrailleEncoding::Ascii), "ABC");
        assert_eq!(encode("⠼⠃⠚", BrailleEncoding::Ascii), "#BJ");
        assert_eq!(encode("⠀\n⠿", BrailleEncoding::Ascii), " \n=");
    }
}
