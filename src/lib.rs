mod add;
mod cast;
mod context;
mod float;
mod limb;
mod sub;

#[cfg(test)]
mod bigint;
#[cfg(test)]
mod utils;
#[cfg(test)]
mod verify;

pub use self::context::{Context, Flags, EMAX_DEFAULT, EMIN_DEFAULT};
pub use self::float::{Category, Float, RoundingMode};
