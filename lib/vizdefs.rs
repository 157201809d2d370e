use tabbycat::attributes::Color;

pub const FONT: &str = "DejaVu Sans";
pub const FONTSIZE: f64 = 10.0; // pt
pub const BOX_HEIGHT: f64 = 0.25; // in
pub const NODE_MARGIN: f64 = 0.05; // in

pub const GATE_COLOR      : Color = Color::Rgb(250, 205, 115); // yellow
pub const CONTROLLED_COLOR: Color = Color::Rgb(115, 150, 250); // blue
pub const SWAP_COLOR      : Color = Color::Rgb(230, 115, 125); // red
pub const RESET_COLOR     : Color = Color::Rgb(190, 190, 190); // gray
