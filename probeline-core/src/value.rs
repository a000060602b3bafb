//! Loggable values
//!
//! A [`Value`] is one scalar of a fixed set of kinds. [`ValueArray`] is a
//! borrowed slice of one kind, so arrays never need a byte stride.

/// Kinds of loggable values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueKind {
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Char,
    Byte,
}

impl ValueKind {
    /// Decode a raw kind tag
    ///
    /// Tags follow declaration order. Unknown tags yield `None`, which
    /// formats as empty text.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ValueKind::Int),
            1 => Some(ValueKind::UInt),
            2 => Some(ValueKind::Long),
            3 => Some(ValueKind::ULong),
            4 => Some(ValueKind::Float),
            5 => Some(ValueKind::Char),
            6 => Some(ValueKind::Byte),
            _ => None,
        }
    }

    /// Raw tag for this kind
    pub fn to_tag(self) -> u8 {
        self as u8
    }
}

/// A single loggable scalar
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    /// Signed 32-bit integer
    Int(i32),
    /// Unsigned 32-bit integer
    UInt(u32),
    /// Signed wide integer
    Long(i64),
    /// Unsigned wide integer
    ULong(u64),
    /// 32-bit float
    Float(f32),
    /// Character, written literally
    Char(char),
    /// Byte, written as a decimal number
    Byte(u8),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Long(_) => ValueKind::Long,
            Value::ULong(_) => ValueKind::ULong,
            Value::Float(_) => ValueKind::Float,
            Value::Char(_) => ValueKind::Char,
            Value::Byte(_) => ValueKind::Byte,
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl<'a> From<&'a [$ty]> for ValueArray<'a> {
                fn from(v: &'a [$ty]) -> Self {
                    ValueArray::$variant(v)
                }
            }

            impl<'a, const N: usize> From<&'a [$ty; N]> for ValueArray<'a> {
                fn from(v: &'a [$ty; N]) -> Self {
                    ValueArray::$variant(v)
                }
            }
        )*
    };
}

impl_value_from! {
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    f32 => Float,
    char => Char,
    u8 => Byte,
}

/// A borrowed array of values of one kind
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueArray<'a> {
    Int(&'a [i32]),
    UInt(&'a [u32]),
    Long(&'a [i64]),
    ULong(&'a [u64]),
    Float(&'a [f32]),
    Char(&'a [char]),
    Byte(&'a [u8]),
}

impl<'a> ValueArray<'a> {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueArray::Int(_) => ValueKind::Int,
            ValueArray::UInt(_) => ValueKind::UInt,
            ValueArray::Long(_) => ValueKind::Long,
            ValueArray::ULong(_) => ValueKind::ULong,
            ValueArray::Float(_) => ValueKind::Float,
            ValueArray::Char(_) => ValueKind::Char,
            ValueArray::Byte(_) => ValueKind::Byte,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueArray::Int(s) => s.len(),
            ValueArray::UInt(s) => s.len(),
            ValueArray::Long(s) => s.len(),
            ValueArray::ULong(s) => s.len(),
            ValueArray::Float(s) => s.len(),
            ValueArray::Char(s) => s.len(),
            ValueArray::Byte(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as a [`Value`]
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ValueArray::Int(s) => s.get(index).copied().map(Value::Int),
            ValueArray::UInt(s) => s.get(index).copied().map(Value::UInt),
            ValueArray::Long(s) => s.get(index).copied().map(Value::Long),
            ValueArray::ULong(s) => s.get(index).copied().map(Value::ULong),
            ValueArray::Float(s) => s.get(index).copied().map(Value::Float),
            ValueArray::Char(s) => s.get(index).copied().map(Value::Char),
            ValueArray::Byte(s) => s.get(index).copied().map(Value::Byte),
        }
    }

    /// Iterate over the elements in order
    pub fn iter(&self) -> impl Iterator<Item = Value> + 'a {
        let array = *self;
        (0..array.len()).filter_map(move |i| array.get(i))
    }
}

/// A value that can be logged bit by bit
///
/// Bytes are produced least significant first, matching the memory layout of
/// a little-endian MCU.
pub trait Register: Copy {
    type Bytes: AsRef<[u8]>;

    fn register_bytes(self) -> Self::Bytes;
}

macro_rules! impl_register {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Register for $ty {
                type Bytes = [u8; core::mem::size_of::<$ty>()];

                fn register_bytes(self) -> Self::Bytes {
                    self.to_le_bytes()
                }
            }
        )*
    };
}

impl_register!(u8, i8, u16, u32, u64);
