//! Macros for ergonomic state machine construction.

/// Declare a state key enum.
///
/// Derives everything [`StateKey`](crate::core::StateKey) requires and
/// implements `name()` from the variant identifiers.
///
/// # Example
///
/// ```
/// use tickwise::core::StateKey;
/// use tickwise::state_enum;
///
/// state_enum! {
///     pub enum ClawState {
///         Open,
///         Closed,
///         Holding,
///     }
/// }
///
/// assert_eq!(ClawState::Holding.name(), "Holding");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateKey for $name {
            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
