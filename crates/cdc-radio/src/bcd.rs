//! ---
//! cdc_section: "04-radio-protocol"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "BCD track number conversion."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---

/// Convert a track number into the two-digit BCD byte the radio displays.
///
/// The display has no track 00 and tops out at 99, so values above 99 are
/// folded back into 1..=99 by repeatedly subtracting 99, and 0 maps to 1.
pub fn bcd_track(track: u8) -> u8 {
    let mut t = track;
    while t > 99 {
        t -= 99;
    }
    if t == 0 {
        t = 1;
    }
    ((t / 10) << 4) | (t % 10)
}

#[cfg(test)]
mod tests {
    use super::bcd_track;

    #[test]
    fn plain_two_digit_tracks() {
        assert_eq!(bcd_track(1), 0x01);
        assert_eq!(bcd_track(9), 0x09);
        assert_eq!(bcd_track(10), 0x10);
        assert_eq!(bcd_track(42), 0x42);
        assert_eq!(bcd_track(99), 0x99);
    }

    #[test]
    fn boundaries_fold_into_one_to_ninety_nine() {
        assert_eq!(bcd_track(0), 0x01);
        assert_eq!(bcd_track(100), 0x01);
        assert_eq!(bcd_track(199), 0x01);
        assert_eq!(bcd_track(101), 0x02);
        assert_eq!(bcd_track(255), 0x57);
    }
}
