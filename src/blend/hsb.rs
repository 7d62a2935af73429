//! Canonical RGB <-> HSB conversion pair shared by the hue, saturation,
//! color and luminosity blend modes.
//!
//! Hue is cyclic in `[0, 1)`; saturation and brightness are in `[0, 1]`.
//! Both directions follow the standard HSB model with round-half-up
//! quantization back to 8 bits, so a round trip through `[h, s, b]`
//! reproduces the source pixel exactly.

pub(crate) fn rgb_to_hsb(rgb: [u8; 3]) -> [f32; 3] {
    let r = i32::from(rgb[0]);
    let g = i32::from(rgb[1]);
    let b = i32::from(rgb[2]);

    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);

    let brightness = cmax as f32 / 255.0;
    let saturation = if cmax != 0 {
        (cmax - cmin) as f32 / cmax as f32
    } else {
        0.0
    };

    let hue = if saturation == 0.0 {
        0.0
    } else {
        let chroma = (cmax - cmin) as f32;
        let redc = (cmax - r) as f32 / chroma;
        let greenc = (cmax - g) as f32 / chroma;
        let bluec = (cmax - b) as f32 / chroma;
        let sector = if r == cmax {
            bluec - greenc
        } else if g == cmax {
            2.0 + redc - bluec
        } else {
            4.0 + greenc - redc
        };
        let mut h = sector / 6.0;
        if h < 0.0 {
            h += 1.0;
        }
        h
    };

    [hue, saturation, brightness]
}

pub(crate) fn hsb_to_rgb(hsb: [f32; 3]) -> [u8; 3] {
    let [hue, saturation, brightness] = hsb;

    let quantize = |v: f32| (v * 255.0 + 0.5) as u8;

    if saturation == 0.0 {
        let v = quantize(brightness);
        return [v, v, v];
    }

    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match h as u32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };

    [quantize(r), quantize(g), quantize(b)]
}
