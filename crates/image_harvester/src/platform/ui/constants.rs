/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 30;
pub const BAR_FILLED: char = '#';
pub const BAR_EMPTY: char = '-';
/// Status text is padded to this width so shorter lines overwrite longer ones.
pub const STATUS_WIDTH: usize = 24;
