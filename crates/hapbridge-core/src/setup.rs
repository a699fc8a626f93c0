// ── Setup-code encoding ──
//
// Packs (category, transport flags, PIN) into the 9-character base-36
// payload of an `X-HM://` setup URI, the string pairing clients scan
// from a QR code.
//
// Bit layout, most significant first:
//
//   version:3 | reserved:4 | category:8 | flags:4 | pin:27

/// Literal prefix of every setup URI.
pub const SETUP_URI_PREFIX: &str = "X-HM://";

/// Minimum width of the base-36 payload. Shorter renderings are
/// zero-padded on the left; longer ones are kept as-is.
pub const PAYLOAD_WIDTH: usize = 9;

const VERSION: u64 = 0;
const RESERVED: u64 = 0;
const PIN_SHIFT: u32 = 27;
// Wider than the 27-bit slot. Kept so existing pairing clients decode
// the same payload; any 8-digit PIN fits in 27 bits either way.
const PIN_MASK: u64 = 0x7fff_ffff;

/// Transport advertised in the setup payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportFlags(u8);

impl TransportFlags {
    /// IP (Wi-Fi / Ethernet) transport.
    pub const IP: Self = Self(2);
    /// Bluetooth LE transport.
    pub const BLE: Self = Self(4);
    /// IP with Wireless Accessory Configuration.
    pub const IP_WAC: Self = Self(8);

    /// Raw 4-bit flag value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Combine two transports into one flag set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for TransportFlags {
    fn default() -> Self {
        Self::IP
    }
}

/// Encode a setup URI advertising the IP transport.
///
/// A `pin` that is not a plain base-10 number encodes as zero.
///
/// ```
/// use hapbridge_core::encode_setup_uri;
///
/// assert_eq!(encode_setup_uri(2, "ABCD", "03145154"), "X-HM://0023ISYWYABCD");
/// ```
pub fn encode_setup_uri(category: u8, setup_id: &str, pin: &str) -> String {
    encode_setup_uri_with_flags(category, TransportFlags::IP, setup_id, pin)
}

/// Encode a setup URI with an explicit transport flag set.
pub fn encode_setup_uri_with_flags(
    category: u8,
    flags: TransportFlags,
    setup_id: &str,
    pin: &str,
) -> String {
    let payload = to_base36(pack(category, flags, parse_pin(pin)));
    format!(
        "{SETUP_URI_PREFIX}{payload:0>width$}{setup_id}",
        width = PAYLOAD_WIDTH
    )
}

fn pack(category: u8, flags: TransportFlags, pin: u64) -> u64 {
    let mut value = VERSION & 0x7;

    value <<= 4;
    value |= RESERVED & 0xf;

    value <<= 8;
    value |= u64::from(category);

    value <<= 4;
    value |= u64::from(flags.bits()) & 0xf;

    value <<= PIN_SHIFT;
    value | (pin & PIN_MASK)
}

/// Parse a decimal PIN, falling back to zero. Signs, whitespace, and the
/// `XXX-XX-XXX` display form are all rejected.
fn parse_pin(pin: &str) -> u64 {
    if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    pin.parse().unwrap_or(0)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }

    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        let digit = u32::try_from(value % 36)
            .ok()
            .and_then(|d| char::from_digit(d, 36))
            .unwrap_or('0');
        digits.push(digit.to_ascii_uppercase());
        value /= 36;
    }
    digits.iter().rev().collect()
}
