//! Domain definitions.

/// Defines a trimmed, non-empty, length-limited text newtype.
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(max = $max:literal);
    ) => {
        #[doc = $doc]
        #[derive(
            ::derive_more::AsRef,
            Clone,
            Debug,
            ::derive_more::Display,
            Eq,
            Hash,
            PartialEq,
        )]
        #[as_ref(str, String)]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent)
        )]
        pub struct $name(String);

        impl $name {
            #[doc = concat!(
                "Creates a new [`", stringify!($name), "`] if the given ",
                "`value` is valid.",
            )]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                Self::check(&value).then_some(Self(value))
            }

            #[doc = concat!(
                "Checks whether the given `value` is a valid [`",
                stringify!($name),
                "`].",
            )]
            fn check(value: impl AsRef<str>) -> bool {
                let value = value.as_ref();
                value.trim() == value
                    && !value.is_empty()
                    && value.chars().count() <= $max
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
                    .ok_or(concat!("invalid `", stringify!($name), "`"))
            }
        }
    };
}

pub mod contract;
pub mod extension;
pub mod import;
pub mod passport;
pub mod teacher;
pub mod user;

pub use self::{
    contract::Contract, extension::Extension, import::Import,
    passport::Passport, teacher::Teacher,
};

#[cfg(test)]
mod spec {
    define_text! {
        #[doc = "Text used in tests."]
        struct Sample(max = 5);
    }

    #[test]
    fn accepts_trimmed_text_within_limit() {
        assert!(Sample::new("abc").is_some());
        assert!(Sample::new("ñandú").is_some());
        assert!("abcde".parse::<Sample>().is_ok());
    }

    #[test]
    fn rejects_invalid_text() {
        assert!(Sample::new("").is_none());
        assert!(Sample::new(" abc").is_none());
        assert!(Sample::new("abc ").is_none());
        assert!(Sample::new("abcdef").is_none());
        assert_eq!("".parse::<Sample>(), Err("invalid `Sample`"));
    }
}
