//! Very simple functions for producing KML files of idling hotspots.
//!
//! This is not a general solution at all. It only implements the handful of elements needed to
//! show ranked hotspots as placemarks, with a streaming style API. That means the user is
//! responsible for closing all tags.

use crate::{
    summary::{HotspotSink, HotspotSummary},
    Cluster, IdleSpotResult,
};
use chrono::{DateTime, Utc};
use std::{
    borrow::Cow,
    fmt::Write as _,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const HOTSPOT_STYLE: &str = "hotspot";
const HOTSPOT_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/caution.png";
const HOTSPOT_ICON_SCALE: f64 = 1.2;
const FOLDER_NAME: &str = "Idling Hotspots";

/// A KML document. The closing tags are written when it is dropped.
pub struct KmlFile<W: Write>(W);

impl KmlFile<BufWriter<File>> {
    /// Create a file and start the document.
    pub fn create<P: AsRef<Path>>(pth: P) -> IdleSpotResult<Self> {
        let f = File::create(pth.as_ref())?;
        KmlFile::from_writer(BufWriter::new(f))
    }
}

impl<W: Write> KmlFile<W> {
    /// Start a document on any writer.
    pub fn from_writer(wrt: W) -> IdleSpotResult<Self> {
        let mut new = KmlFile(wrt);
        new.start_document()?;
        Ok(new)
    }
}

impl<W: Write> KmlWriter for KmlFile<W> {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl<W: Write> Drop for KmlFile<W> {
    fn drop(&mut self) {
        self.finish_document();
    }
}

impl<W: Write> HotspotSink for KmlFile<W> {
    fn deliver(&mut self, hotspots: &[Cluster]) -> IdleSpotResult<()> {
        self.write_icon_style(HOTSPOT_STYLE, HOTSPOT_ICON, HOTSPOT_ICON_SCALE)?;
        self.start_folder(FOLDER_NAME)?;

        for (clust, summary) in hotspots.iter().zip(HotspotSummary::from_ranked(hotspots)) {
            let name = format!("{}. {} event(s)", summary.rank, summary.total_events);

            self.start_placemark(
                &name,
                &hotspot_description(clust, &summary),
                &format!("#{}", HOTSPOT_STYLE),
            )?;

            let (start, end) = clust.time_range();
            self.timespan(start, end)?;
            self.create_point(summary.centroid.lat, summary.centroid.lon)?;

            self.finish_placemark()?;
        }

        self.finish_folder()?;
        self.output().flush()?;

        Ok(())
    }
}

/// The HTML shown in the balloon for a hotspot, one line per vehicle.
fn hotspot_description(clust: &Cluster, summary: &HotspotSummary) -> String {
    let mut description = String::new();

    // Writing to a String can't fail.
    let _ = write!(
        description,
        "Total idle time: {} s<br/>Vehicles: {}<ul>",
        summary.total_duration_seconds, summary.vehicles
    );
    for (vehicle, count) in clust.vehicle_counts() {
        let _ = write!(
            description,
            "<li>{}: {} event(s)</li>",
            escape_text(vehicle),
            count
        );
    }
    let _ = write!(
        description,
        "</ul>Events: {}",
        escape_text(&summary.representative_ids.join(", "))
    );

    description
}

/// Replace the characters that are special in XML text with entities.
fn escape_text(text: &str) -> Cow<str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> IdleSpotResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
        let _ = self.output().flush();
    }

    /// Write a description element to the file. A `]]>` in the text is split across two CDATA
    /// sections so it cannot end the first one early.
    fn write_description(&mut self, description: &str) -> IdleSpotResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description.replace("]]>", "]]]]><![CDATA[>")
        )?;
        Ok(())
    }

    /// Start a KML folder that is expanded when the file is opened.
    fn start_folder(&mut self, name: &str) -> IdleSpotResult<()> {
        writeln!(
            self.output(),
            "<Folder>\n<name>{}</name>\n<open>1</open>",
            escape_text(name)
        )?;
        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> IdleSpotResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: &str,
        description: &str,
        style_url: &str,
    ) -> IdleSpotResult<()> {
        writeln!(self.output(), "<Placemark>")?;
        writeln!(self.output(), "<name>{}</name>", escape_text(name))?;
        self.write_description(description)?;
        writeln!(
            self.output(),
            "<styleUrl>{}</styleUrl>",
            escape_text(style_url)
        )?;

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> IdleSpotResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Write a style with an IconStyle element.
    fn write_icon_style(
        &mut self,
        style_id: &str,
        icon_url: &str,
        scale: f64,
    ) -> IdleSpotResult<()> {
        writeln!(self.output(), "<Style id=\"{}\">", escape_text(style_id))?;
        writeln!(self.output(), "<IconStyle>")?;
        writeln!(self.output(), "<scale>{}</scale>", scale)?;
        writeln!(
            self.output(),
            "<Icon><href>{}</href></Icon>",
            escape_text(icon_url)
        )?;
        writeln!(self.output(), "</IconStyle>")?;
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Write out a TimeSpan element.
    fn timespan(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> IdleSpotResult<()> {
        self.output().write_all("<TimeSpan>\n".as_bytes())?;
        writeln!(
            self.output(),
            "<begin>{}</begin>",
            start.format("%Y-%m-%dT%H:%M:%S.000Z")
        )?;
        writeln!(
            self.output(),
            "<end>{}</end>",
            end.format("%Y-%m-%dT%H:%M:%S.000Z")
        )?;
        self.output().write_all("</TimeSpan>\n".as_bytes())?;
        Ok(())
    }

    /// Write out a KML Point element on the ground.
    fn create_point(&mut self, lat: f64, lon: f64) -> IdleSpotResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},0</coordinates>\n</Point>",
            lon, lat
        )?;
        Ok(())
    }
}
