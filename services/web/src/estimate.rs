use crate::infra::load_hierarchy;
use clap::Args;
use harpro::config::{AppConfig, PredictionConfig};
use harpro::error::AppError;
use harpro::form::{CascadingSelector, FieldValue, FormField, PropertyFormRecord};
use harpro::gate::{CONSENT_LABEL, DISCLAIMER_POINTS, DISCLAIMER_TITLE};
use harpro::location::LocationLevel;
use harpro::prediction::HttpPredictionClient;
use harpro::session::EstimateSession;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct LocationsArgs {
    /// Island whose provinces should be listed
    #[arg(long)]
    pub(crate) pulau: Option<String>,
    /// Province whose cities should be listed (requires --pulau)
    #[arg(long, requires = "pulau")]
    pub(crate) provinsi: Option<String>,
    /// Print all three option lists as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Island (pulau)
    #[arg(long)]
    pub(crate) pulau: String,
    /// Province (provinsi)
    #[arg(long)]
    pub(crate) provinsi: String,
    /// City or regency (kota/kabupaten)
    #[arg(long)]
    pub(crate) kota: String,
    /// Land area in square metres
    #[arg(long)]
    pub(crate) luas_tanah: f64,
    /// Building area in square metres
    #[arg(long)]
    pub(crate) luas_bangunan: f64,
    /// Bedroom count
    #[arg(long, default_value_t = 1)]
    pub(crate) kamar_tidur: u32,
    /// Bathroom count
    #[arg(long, default_value_t = 1)]
    pub(crate) kamar_mandi: u32,
    /// Parking capacity
    #[arg(long, default_value_t = 0)]
    pub(crate) parkir: u32,
    /// Override PREDICTION_BASE_URL for this run
    #[arg(long)]
    pub(crate) prediction_url: Option<String>,
    /// Accept the disclaimer without prompting
    #[arg(long)]
    pub(crate) agree: bool,
}

pub(crate) fn run_locations(args: LocationsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let hierarchy = load_hierarchy(&config.locations)?;

    let record = PropertyFormRecord::default()
        .with_selection(LocationLevel::Island, args.pulau.unwrap_or_default())
        .with_selection(LocationLevel::Province, args.provinsi.unwrap_or_default());
    let options = CascadingSelector::new(&hierarchy).options(&record);

    if args.json {
        let rendered = serde_json::to_string_pretty(&options).map_err(io::Error::other)?;
        println!("{rendered}");
        return Ok(());
    }

    let level = if record.province.is_empty() {
        if record.island.is_empty() {
            LocationLevel::Island
        } else {
            LocationLevel::Province
        }
    } else {
        LocationLevel::City
    };

    println!("{}:", level.label());
    let labels = options.for_level(level);
    if labels.is_empty() {
        println!("  (tidak ada pilihan)");
    }
    for label in labels {
        println!("  - {label}");
    }
    Ok(())
}

pub(crate) async fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(raw) = args.prediction_url.as_deref() {
        config.prediction.base_url = PredictionConfig::parse_base_url(raw)?;
    }

    let hierarchy = Arc::new(load_hierarchy(&config.locations)?);
    let client = Arc::new(HttpPredictionClient::new(&config.prediction.base_url)?);
    let session = EstimateSession::new(hierarchy, client);

    session.select(LocationLevel::Island, &args.pulau);
    session.select(LocationLevel::Province, &args.provinsi);
    session.select(LocationLevel::City, &args.kota);
    for (field, value) in [
        (FormField::LandArea, args.luas_tanah),
        (FormField::BuildingArea, args.luas_bangunan),
        (FormField::BedroomCount, f64::from(args.kamar_tidur)),
        (FormField::BathroomCount, f64::from(args.kamar_mandi)),
        (FormField::ParkingCapacity, f64::from(args.parkir)),
    ] {
        session.set_field(field, FieldValue::Number(value))?;
    }

    session.request_submit()?;
    let mut stdout = io::stdout().lock();
    render_disclaimer(&mut stdout)?;

    let consented = if args.agree {
        writeln!(stdout, "[x] {CONSENT_LABEL}")?;
        true
    } else {
        let mut stdin = io::stdin().lock();
        read_consent(&mut stdin, &mut stdout)?
    };

    if !consented {
        session.cancel()?;
        writeln!(stdout, "Estimasi dibatalkan.")?;
        return Ok(());
    }
    drop(stdout);

    session.set_consent(true)?;
    session.proceed().await?;

    println!("\n{}", session.view().result);
    Ok(())
}

fn render_disclaimer(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{DISCLAIMER_TITLE}")?;
    for point in DISCLAIMER_POINTS {
        writeln!(out, "  * {point}")?;
    }
    Ok(())
}

/// Ask once; anything but an explicit yes counts as a refusal.
fn read_consent(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{CONSENT_LABEL} [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "ya" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn consent_requires_an_explicit_yes() {
        for (answer, expected) in [
            ("y\n", true),
            ("Ya\n", true),
            ("yes", true),
            ("\n", false),
            ("tidak\n", false),
            ("", false),
        ] {
            let mut output = Vec::new();
            let consented =
                read_consent(&mut Cursor::new(answer), &mut output).expect("prompt succeeds");
            assert_eq!(consented, expected, "answer {answer:?}");
            assert!(String::from_utf8(output)
                .expect("utf8 prompt")
                .starts_with(CONSENT_LABEL));
        }
    }

    #[test]
    fn disclaimer_lists_every_point() {
        let mut output = Vec::new();
        render_disclaimer(&mut output).expect("renders");
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.starts_with(DISCLAIMER_TITLE));
        for point in DISCLAIMER_POINTS {
            assert!(text.contains(point));
        }
    }
}
