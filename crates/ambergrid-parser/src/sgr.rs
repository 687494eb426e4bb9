use ambergrid_common::types::indexed_color;
use ambergrid_common::Attributes;

/// Applies a list of SGR parameters to `attrs`, returning the updated
/// attributes. An empty parameter list resets to `defaults`.
pub fn apply_sgr(attrs: Attributes, defaults: Attributes, parameters: &[i64]) -> Attributes {
    if parameters.is_empty() {
        return defaults;
    }

    let mut attrs = attrs;
    let mut i = 0;
    while i < parameters.len() {
        let param = parameters[i];
        match param {
            0 => attrs = defaults,
            1 => attrs.bold = true,
            3 => attrs.italic = true,
            4 => attrs.underline = true,
            7 => attrs.inverse = true,
            22 => attrs.bold = false,
            23 => attrs.italic = false,
            24 => attrs.underline = false,
            27 => attrs.inverse = false,
            38 | 48 => {
                let foreground = param == 38;
                if i + 1 < parameters.len() {
                    let mode = parameters[i + 1];
                    if mode == 5 && i + 2 < parameters.len() {
                        let index = parameters[i + 2].clamp(0, 255) as u8;
                        let color = indexed_color(index);
                        if foreground {
                            attrs.foreground = color;
                        } else {
                            attrs.background = color;
                        }
                        i += 2;
                    } else if mode == 2 && i + 4 < parameters.len() {
                        let r = parameters[i + 2].clamp(0, 255) as u8;
                        let g = parameters[i + 3].clamp(0, 255) as u8;
                        let b = parameters[i + 4].clamp(0, 255) as u8;
                        let color = ambergrid_common::Color::rgb(r, g, b);
                        if foreground {
                            attrs.foreground = color;
                        } else {
                            attrs.background = color;
                        }
                        i += 4;
                    } else {
                        i += 1;
                    }
                }
            }
            30..=37 | 90..=97 => apply_indexed(&mut attrs, param, true),
            40..=47 | 100..=107 => apply_indexed(&mut attrs, param, false),
            _ => {}
        }
        i += 1;
    }
    attrs
}

fn apply_indexed(attrs: &mut Attributes, param: i64, foreground: bool) {
    let index = match param {
        30..=37 => param - 30,
        40..=47 => param - 40,
        90..=97 => param - 90 + 8,
        100..=107 => param - 100 + 8,
        _ => return,
    } as u8;
    let color = indexed_color(index);
    if foreground {
        attrs.foreground = color;
    } else {
        attrs.background = color;
    }
}
