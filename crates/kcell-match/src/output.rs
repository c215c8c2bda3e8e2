//! Persists grouped matches: flat group files, KML placemarks, diag log.

use projection::LambertConformal;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

use crate::config::OutputLayout;
use crate::diagnostics::Diagnostics;
use crate::error::{KcellError, KcellResult};
use crate::grouping::Group;

/// KML 2.2 namespace.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Name of the KML document.
pub const KML_DOCUMENT_NAME: &str = "CFPP Locations";

/// Writes run artifacts under an [`OutputLayout`].
#[derive(Debug, Clone)]
pub struct OutputWriter {
    layout: OutputLayout,
    projection: LambertConformal,
}

impl OutputWriter {
    pub fn new(layout: OutputLayout, projection: LambertConformal) -> Self {
        Self { layout, projection }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Create the output directory if needed.
    pub fn prepare(&self) -> KcellResult<()> {
        std::fs::create_dir_all(&self.layout.dir)
            .map_err(|e| KcellError::write(&self.layout.dir, e))
    }

    /// One row per point: `"<x> <y> <k>"`, coordinates to 4 decimals.
    pub fn render_group(group: &Group) -> String {
        let mut text = String::with_capacity(group.rows.len() * 32);
        for row in &group.rows {
            text.push_str(&format!(
                "{:.4} {:.4} {}\n",
                row.point.x, row.point.y, row.kcell
            ));
        }
        text
    }

    /// Write each group to `{prefix}{n}.out`. Returns the paths written.
    pub fn write_groups(&self, groups: &[Group]) -> KcellResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(groups.len());
        for group in groups {
            let path = self.layout.group_path(group.number);
            std::fs::write(&path, Self::render_group(group))
                .map_err(|e| KcellError::write(&path, e))?;
            info!(path = %path.display(), rows = group.rows.len(), "Wrote group file");
            paths.push(path);
        }
        Ok(paths)
    }

    /// Render a KML document with one placemark per row, in group order.
    pub fn render_kml(&self, groups: &[Group]) -> KcellResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b'\t', 1);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;
        write_text_element(&mut writer, "name", KML_DOCUMENT_NAME)?;

        for row in groups.iter().flat_map(|g| g.rows.iter()) {
            let (lon, lat) = self.projection.unproject(row.point.x, row.point.y)?;

            writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
            write_text_element(&mut writer, "name", &row.output_index.to_string())?;
            writer.write_event(Event::Start(BytesStart::new("Point")))?;
            write_text_element(&mut writer, "coordinates", &format!("{},{},0", lon, lat))?;
            writer.write_event(Event::End(BytesEnd::new("Point")))?;
            writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))?;

        let mut bytes = writer.into_inner().into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn write_kml(&self, groups: &[Group]) -> KcellResult<PathBuf> {
        let path = self.layout.kml_path();
        let kml = self.render_kml(groups)?;
        std::fs::write(&path, kml).map_err(|e| KcellError::write(&path, e))?;
        info!(path = %path.display(), "Wrote KML");
        Ok(path)
    }

    pub fn write_diagnostics(&self, diag: &Diagnostics) -> KcellResult<PathBuf> {
        let path = self.layout.diag_path();
        diag.write_to(&path)?;
        Ok(path)
    }
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> KcellResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
