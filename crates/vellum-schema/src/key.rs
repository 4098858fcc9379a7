//! Order-preserving byte encodings for index key material.
//!
//! Index keys are compared as unsigned byte strings, so every encoding here
//! must sort the same way the source values do. Strings get a trailing `0x00`
//! terminator: it orders a string before all of its extensions and stops a
//! whole-string lookup from matching longer strings that share its bytes.
//! Fixed-width values need no terminator.

/// A byte buffer holding (part of) an index key.
pub type Key = Vec<u8>;

/// A value that can contribute bytes to an index key.
///
/// Implemented for the primitive shapes lookup arguments and indexed fields
/// take; index accessors and `Transaction` lookups both go through it, so an
/// argument always encodes exactly like the field it is matched against.
pub trait KeyPart {
    fn encode_into(&self, out: &mut Key);
}

impl KeyPart for [u8] {
    fn encode_into(&self, out: &mut Key) {
        out.extend_from_slice(self);
    }
}

impl<const N: usize> KeyPart for [u8; N] {
    fn encode_into(&self, out: &mut Key) {
        out.extend_from_slice(self);
    }
}

impl KeyPart for Vec<u8> {
    fn encode_into(&self, out: &mut Key) {
        out.extend_from_slice(self);
    }
}

impl KeyPart for str {
    fn encode_into(&self, out: &mut Key) {
        out.extend_from_slice(self.as_bytes());
        out.push(0);
    }
}

impl KeyPart for String {
    fn encode_into(&self, out: &mut Key) {
        self.as_str().encode_into(out);
    }
}

impl KeyPart for bool {
    fn encode_into(&self, out: &mut Key) {
        out.push(u8::from(*self));
    }
}

macro_rules! uint_key_part {
    ($($ty:ty),*) => {
        $(impl KeyPart for $ty {
            fn encode_into(&self, out: &mut Key) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        })*
    };
}

uint_key_part!(u8, u16, u32, u64);

impl<P: KeyPart + ?Sized> KeyPart for &P {
    fn encode_into(&self, out: &mut Key) {
        (**self).encode_into(out);
    }
}

/// Encode a sequence of lookup arguments into one key (or key prefix).
pub fn encode_parts(parts: &[&dyn KeyPart]) -> Key {
    let mut out = Key::new();
    for part in parts {
        part.encode_into(&mut out);
    }
    out
}
