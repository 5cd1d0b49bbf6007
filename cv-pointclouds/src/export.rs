use nalgebra::Point3;
use ply_rs::{
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::io::{self, Write};

/// The color of change points that carry no color of their own.
pub const CHANGE_COLOR: [u8; 3] = [255, 0, 0];

/// Writes colored points as the vertices of an ASCII PLY file.
pub fn export(
    mut writer: impl Write,
    points_and_colors: impl IntoIterator<Item = (Point3<f64>, [u8; 3])>,
) -> io::Result<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("3d change points exported by change-sandbox".to_string());

    let mut point_element = ElementDef::new("vertex".to_string());
    for (name, scalar) in [
        ("x", ScalarType::Double),
        ("y", ScalarType::Double),
        ("z", ScalarType::Double),
        ("red", ScalarType::UChar),
        ("green", ScalarType::UChar),
        ("blue", ScalarType::UChar),
    ] {
        let p = PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar));
        point_element.properties.add(p);
    }
    ply.header.elements.add(point_element);

    let vertices: Vec<DefaultElement> = points_and_colors
        .into_iter()
        .map(|(p, [r, g, b])| {
            let mut point = DefaultElement::new();
            point.insert("x".to_string(), Property::Double(p.x));
            point.insert("y".to_string(), Property::Double(p.y));
            point.insert("z".to_string(), Property::Double(p.z));
            point.insert("red".to_string(), Property::UChar(r));
            point.insert("green".to_string(), Property::UChar(g));
            point.insert("blue".to_string(), Property::UChar(b));
            point
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let w = Writer::new();
    w.write_ply(&mut writer, &mut ply)?;
    writer.flush()
}

/// Writes uncolored change points in [`CHANGE_COLOR`].
pub fn export_change_points(
    writer: impl Write,
    points: impl IntoIterator<Item = Point3<f64>>,
) -> io::Result<()> {
    export(writer, points.into_iter().map(|p| (p, CHANGE_COLOR)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_ply;

    #[test]
    fn exported_points_read_back() {
        let points = vec![Point3::new(0.5, -1.0, 2.25), Point3::new(3.0, 4.0, 5.0)];
        let mut buffer = vec![];
        export_change_points(&mut buffer, points.iter().copied()).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("ply\nformat ascii 1.0\n"));
        assert!(text.contains("element vertex 2\n"));
        let rows: Vec<Vec<&str>> = text
            .split("end_header\n")
            .nth(1)
            .unwrap()
            .lines()
            .map(|row| row.split_whitespace().collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["0.5", "-1", "2.25", "255", "0", "0"],
                vec!["3", "4", "5", "255", "0", "0"],
            ]
        );

        let mesh = read_ply(buffer.as_slice()).unwrap();
        assert_eq!(mesh.vertices, points);
        assert!(mesh.faces.is_empty());
    }

    /// Accepts writes but fails to flush, like a full disk behind a buffered file.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn flush_failure_is_reported() {
        let mut writer = FailingFlush(vec![]);
        let err = export_change_points(&mut writer, [Point3::origin()]).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
