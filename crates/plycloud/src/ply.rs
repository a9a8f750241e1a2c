//! PLY point cloud reading and writing on top of `ply-rs`.

use crate::{CloudError, Color, PointCloud};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const POSITION_NAMES: [&str; 3] = ["x", "y", "z"];
const COLOR_NAMES: [&str; 3] = ["red", "green", "blue"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyEncoding {
    Ascii,
    #[default]
    BinaryLittleEndian,
}

impl From<PlyEncoding> for Encoding {
    fn from(value: PlyEncoding) -> Self {
        match value {
            PlyEncoding::Ascii => Encoding::Ascii,
            PlyEncoding::BinaryLittleEndian => Encoding::BinaryLittleEndian,
        }
    }
}

fn scalar(prop: &Property) -> Option<f64> {
    match *prop {
        Property::Char(v) => Some(v as f64),
        Property::UChar(v) => Some(v as f64),
        Property::Short(v) => Some(v as f64),
        Property::UShort(v) => Some(v as f64),
        Property::Int(v) => Some(v as f64),
        Property::UInt(v) => Some(v as f64),
        Property::Float(v) => Some(v as f64),
        Property::Double(v) => Some(v),
        _ => None,
    }
}

/// Normalizes a stored color channel to 0..1 according to its type.
fn channel(prop: &Property, name: &'static str) -> Result<f32, CloudError> {
    let v = match *prop {
        Property::UChar(v) => v as f32 / 255.0,
        Property::UShort(v) => v as f32 / 65_535.0,
        Property::Float(v) => v,
        Property::Double(v) => v as f32,
        _ => return Err(CloudError::UnsupportedColor(name)),
    };
    Ok(v.clamp(0.0, 1.0))
}

pub fn read_ply<P: AsRef<Path>>(path: P) -> Result<PointCloud, CloudError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_ply_from(&mut reader)
}

/// Parses the `vertex` element of a PLY stream.
pub fn read_ply_from<R: Read>(reader: &mut R) -> Result<PointCloud, CloudError> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(reader)?;

    let has_colors = ply
        .header
        .elements
        .get("vertex")
        .map(|def| COLOR_NAMES.iter().all(|n| def.properties.contains_key(*n)))
        .unwrap_or(false);

    let vertices = match ply.payload.get("vertex") {
        Some(v) => v,
        None if ply.header.elements.contains_key("vertex") => return Ok(PointCloud::new()),
        None => return Err(CloudError::MissingElement("vertex")),
    };

    let mut positions = Vec::with_capacity(vertices.len());
    let mut colors: Vec<Color> = Vec::with_capacity(if has_colors { vertices.len() } else { 0 });

    for (index, vertex) in vertices.iter().enumerate() {
        let mut p = [0.0f64; 3];
        for (axis, &name) in POSITION_NAMES.iter().enumerate() {
            p[axis] = vertex
                .get(name)
                .and_then(scalar)
                .ok_or(CloudError::MissingProperty { index, name })?;
        }
        positions.push(p);

        if has_colors {
            let mut c = [0.0f32; 3];
            for (ch, &name) in COLOR_NAMES.iter().enumerate() {
                let prop = vertex
                    .get(name)
                    .ok_or(CloudError::MissingProperty { index, name })?;
                c[ch] = channel(prop, name)?;
            }
            colors.push(c);
        }
    }

    let cloud = PointCloud::from_positions(positions);
    if has_colors {
        cloud.with_colors(colors)
    } else {
        log::warn!("PLY vertices carry no red/green/blue properties");
        Ok(cloud)
    }
}

pub fn write_ply<P: AsRef<Path>>(
    path: P,
    cloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<usize, CloudError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let written = write_ply_to(&mut writer, cloud, encoding)?;
    writer.flush()?;
    Ok(written)
}

/// Writes positions as `double` and colors as `uchar`; returns bytes written.
pub fn write_ply_to<W: Write>(
    out: &mut W,
    cloud: &PointCloud,
    encoding: PlyEncoding,
) -> Result<usize, CloudError> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = encoding.into();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    vertex_def.count = cloud.len();
    for name in POSITION_NAMES {
        vertex_def.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    let colors = cloud.checked_colors()?;
    if colors.is_some() {
        for name in COLOR_NAMES {
            vertex_def.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
    }
    ply.header.elements.add(vertex_def);

    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut rows = Vec::with_capacity(cloud.len());
    for (i, p) in cloud.positions.iter().enumerate() {
        let mut row = DefaultElement::new();
        for (axis, name) in POSITION_NAMES.iter().enumerate() {
            row.insert(name.to_string(), Property::Double(p[axis]));
        }
        if let Some(colors) = colors {
            for (ch, name) in COLOR_NAMES.iter().enumerate() {
                row.insert(name.to_string(), Property::UChar(to_u8(colors[i][ch])));
            }
        }
        rows.push(row);
    }
    ply.payload.insert("vertex".to_string(), rows);

    let written = Writer::new().write_ply(out, &mut ply)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ASCII_PLY: &str = "ply
format ascii 1.0
comment written by a scanner export
element vertex 3
property double x
property double y
property double z
property uchar red
property uchar green
property uchar blue
end_header
155000.25 463000.5 1.5 255 0 51
155001.25 463001.5 2.5 0 255 102
155002.25 463002.5 3.5 0 0 255
";

    #[test]
    fn reads_ascii_with_uchar_colors() {
        let cloud = read_ply_from(&mut Cursor::new(ASCII_PLY)).unwrap();

        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.positions[0], [155000.25, 463000.5, 1.5]);
        let colors = cloud.colors.as_ref().unwrap();
        assert_eq!(colors[0], [1.0, 0.0, 0.2]);
        assert_eq!(colors[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn reads_float_positions_without_colors() {
        let src = "ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
0.5 1 2
-3 4 5.25
";
        let cloud = read_ply_from(&mut Cursor::new(src)).unwrap();
        assert_eq!(cloud.positions, vec![[0.5, 1.0, 2.0], [-3.0, 4.0, 5.25]]);
        assert!(cloud.colors.is_none());
    }

    #[test]
    fn missing_vertex_element_is_an_error() {
        let src = "ply
format ascii 1.0
element face 0
property list uchar int vertex_indices
end_header
";
        assert!(matches!(
            read_ply_from(&mut Cursor::new(src)),
            Err(CloudError::MissingElement("vertex"))
        ));
    }

    #[test]
    fn binary_file_keeps_projected_precision() {
        let cloud = PointCloud::from_positions(vec![
            [155_000.123_456, 463_000.654_321, 12.5],
            [155_010.0, 463_020.0, -3.25],
        ])
        .with_colors(vec![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]])
        .unwrap();

        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_ply(tmp.path(), &cloud, PlyEncoding::BinaryLittleEndian).unwrap();
        let loaded = read_ply(tmp.path()).unwrap();

        assert_eq!(loaded, cloud);
    }

    #[test]
    fn writing_mismatched_colors_is_an_error() {
        let cloud = PointCloud {
            positions: vec![[0.0; 3]; 2],
            colors: Some(vec![[0.0, 1.0, 0.0]]),
        };
        let mut out = Vec::new();
        assert!(matches!(
            write_ply_to(&mut out, &cloud, PlyEncoding::Ascii),
            Err(CloudError::ColorCountMismatch { positions: 2, colors: 1 })
        ));
    }
}
