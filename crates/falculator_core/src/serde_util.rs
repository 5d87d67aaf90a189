//! Serde support shared by the model enums.
//!
//! Persisted configs written by older versions encode enums as bare
//! integers; current documents use the symbolic name. Every enum that
//! crosses the persistence boundary therefore serializes by name and
//! deserializes from either form.

/// Defines a fieldless enum that serializes as its variant name and
/// deserializes from the name or the legacy integer discriminant.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $index:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                struct Visitor;

                impl<'de> ::serde::de::Visitor<'de> for Visitor {
                    type Value = $name;

                    fn expecting(
                        &self,
                        f: &mut ::std::fmt::Formatter<'_>,
                    ) -> ::std::fmt::Result {
                        write!(
                            f,
                            concat!("a ", stringify!($name), " name or legacy integer")
                        )
                    }

                    fn visit_str<E: ::serde::de::Error>(
                        self,
                        value: &str,
                    ) -> Result<$name, E> {
                        match value {
                            $(stringify!($variant) => Ok($name::$variant),)+
                            _ => Err(E::unknown_variant(
                                value,
                                &[$(stringify!($variant)),+],
                            )),
                        }
                    }

                    fn visit_u64<E: ::serde::de::Error>(
                        self,
                        value: u64,
                    ) -> Result<$name, E> {
                        match value {
                            $($index => Ok($name::$variant),)+
                            _ => Err(E::invalid_value(
                                ::serde::de::Unexpected::Unsigned(value),
                                &self,
                            )),
                        }
                    }

                    fn visit_i64<E: ::serde::de::Error>(
                        self,
                        value: i64,
                    ) -> Result<$name, E> {
                        let unsigned = u64::try_from(value).map_err(|_| {
                            E::invalid_value(::serde::de::Unexpected::Signed(value), &self)
                        })?;
                        self.visit_u64(unsigned)
                    }
                }

                deserializer.deserialize_any(Visitor)
            }
        }
    };
}

pub(crate) use named_enum;
