use geo::Rect;
use serde::Deserialize;


/// Kind of elevation coverage served by the coverage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Dsm,
    Dtm,
}

impl Coverage {
    pub fn id(&self) -> &'static str {
        match self {
            Coverage::Dsm => "dsm_05m",
            Coverage::Dtm => "dtm_05m",
        }
    }
}

/// Base addresses of the remote data sources. Only request URLs are built
/// here, nothing is fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub building_tiles: String,
    pub neighbourhoods: String,
    pub elevation: String,
    pub coverage_resolution: f64,
}

impl Default for SourceUrls {
    fn default() -> Self {
        SourceUrls {
            building_tiles: "https://download.pdok.nl/kadaster/basisvoorziening-3d/v1_0/2020/hoogtestatistieken"
                .to_string(),
            neighbourhoods: "https://service.pdok.nl/cbs/wijkenbuurten/2023/wfs/v1_0?request=GetFeature\
                             &service=WFS&version=1.1.0&typeName=wb2021:buurten&filter="
                .to_string(),
            elevation: "https://service.pdok.nl/rws/ahn/wcs/v1_0".to_string(),
            coverage_resolution: 2.5,
        }
    }
}

impl SourceUrls {
    pub fn building_tile(&self, suffix: &str) -> String {
        format!(
            "{}/{}_2020_hoogtestatistieken_gebouwen.zip",
            self.building_tiles.trim_end_matches('/'),
            suffix
        )
    }

    pub fn neighbourhood_boundaries(&self, codes: &[&str]) -> String {
        let clauses: String = codes
            .iter()
            .map(|code| {
                format!(
                    "<PropertyIsEqualTo matchCase=\"true\"><ValueReference>buurtcode</ValueReference>\
                     <Literal>{}</Literal></PropertyIsEqualTo>",
                    code
                )
            })
            .collect();

        let filter = if codes.len() > 1 {
            format!("<Filter><Or>{}</Or></Filter>", clauses)
        } else {
            format!("<Filter>{}</Filter>", clauses)
        };

        format!("{}{}", self.neighbourhoods, encode_filter(&filter))
    }

    pub fn coverage(&self, coverage: Coverage, bbox: &Rect<f64>, epsg: u32) -> String {
        format!(
            "{}?SERVICE=WCS&VERSION=1.0.0&REQUEST=GetCoverage&COVERAGE={}&CRS=EPSG:{}\
             &BBOX={},{},{},{}&RESX={res}&RESY={res}&FORMAT=image/tiff",
            self.elevation,
            coverage.id(),
            epsg,
            bbox.min().x,
            bbox.min().y,
            bbox.max().x,
            bbox.max().y,
            res = self.coverage_resolution
        )
    }
}

fn encode_filter(filter: &str) -> String {
    let mut out = String::with_capacity(filter.len() * 2);
    for c in filter.chars() {
        match c {
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '"' => out.push_str("%22"),
            ' ' => out.push_str("%20"),
            c => out.push(c),
        }
    }
    out
}
