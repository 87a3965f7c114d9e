pub mod slowmodes;
