//! # 图片取色工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果输出。
//! 提取逻辑位于 `color_extractor` 模块，详见 `lib.rs` 架构文档。

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::process;

use image_to_colors::error::AppError;
use image_to_colors::{ColorExtractor, CuttingMode, CuttingParameters, ExtractionParameters, ExtractorConfig};

fn build_cli() -> Command {
    Command::new("image-to-colors")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract the RGB color of every sampled pixel of an image")
        .arg(
            Arg::new("uri")
                .help("Image location: http(s) URL, data URL, file:// URL or local path")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("detailing")
                .short('d')
                .long("detailing")
                .help("Rescale the image to this percentage of its native size before cutting")
                .value_name("PERCENT")
                .required(false),
        )
        .arg(
            Arg::new("cut")
                .short('c')
                .long("cut")
                .help("Region to extract as 'x,y,width,height' (negative width/height grow left/up)")
                .value_name("X,Y,W,H")
                .allow_hyphen_values(true)
                .required(false),
        )
        .arg(
            Arg::new("cut-mode")
                .long("cut-mode")
                .help("Unit of the --cut values")
                .value_name("MODE")
                .value_parser(["pixels", "percentage"])
                .default_value("pixels"),
        )
        .arg(
            Arg::new("anonymous")
                .long("anonymous")
                .help("Fetch the image without sending any credentials")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("allow-private-network")
                .long("allow-private-network")
                .help("Allow downloading from loopback and private network addresses")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .help("Resampling filter for --detailing (nearest, triangle, catmull-rom, gaussian, lanczos3)")
                .value_name("FILTER")
                .default_value("triangle"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Pretty-print the JSON output")
                .action(ArgAction::SetTrue),
        )
}

/// 解析 `x,y,width,height` 形式的切割参数。
fn parse_cut(value: &str, mode: CuttingMode) -> Result<CuttingParameters, AppError> {
    let numbers = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| AppError::InvalidArgument(format!("无法解析切割数值 '{}': {}", part, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let &[from_x, from_y, width, height] = numbers.as_slice() else {
        return Err(AppError::InvalidArgument(format!(
            "切割参数需要 4 个数值，实际为 {} 个",
            numbers.len()
        )));
    };

    Ok(CuttingParameters {
        mode,
        from_x,
        from_y,
        width,
        height,
    })
}

fn parameters_from_matches(matches: &ArgMatches) -> Result<ExtractionParameters, AppError> {
    let mut parameters =
        ExtractionParameters::default().with_cross_origin_anonymous(matches.get_flag("anonymous"));

    if let Some(detailing) = matches.get_one::<String>("detailing") {
        let percentage = detailing
            .trim()
            .parse::<f64>()
            .map_err(|e| AppError::InvalidArgument(format!("无法解析细节百分比 '{}': {}", detailing, e)))?;
        parameters = parameters.with_detailing_percentage(percentage);
    }

    if let Some(cut) = matches.get_one::<String>("cut") {
        let mode = match matches.get_one::<String>("cut-mode").map(String::as_str) {
            Some("percentage") => CuttingMode::Percentage,
            _ => CuttingMode::Pixels,
        };
        parameters = parameters.with_cutting(parse_cut(cut, mode)?);
    }

    Ok(parameters)
}

fn config_from_matches(matches: &ArgMatches) -> Result<ExtractorConfig, AppError> {
    let mut config = ExtractorConfig::default();
    config.allow_private_network = matches.get_flag("allow-private-network");

    if let Some(filter) = matches.get_one::<String>("filter") {
        config.resize_filter = ExtractorConfig::parse_filter(filter)?;
    }

    Ok(config)
}

async fn run(matches: ArgMatches) -> Result<(), AppError> {
    let uri = matches
        .get_one::<String>("uri")
        .ok_or_else(|| AppError::InvalidArgument("缺少图片地址".to_string()))?;
    let parameters = parameters_from_matches(&matches)?;
    let extractor = ColorExtractor::new(config_from_matches(&matches)?)?;

    let colors = extractor
        .get_from_external_source(uri, Some(&parameters))
        .await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if matches.get_flag("pretty") {
        serde_json::to_writer_pretty(&mut out, &colors)?;
    } else {
        serde_json::to_writer(&mut out, &colors)?;
    }
    writeln!(out)?;

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();

    if let Err(err) = run(matches).await {
        log::error!("颜色提取失败 [{}]: {}", err.code(), err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cut_accepts_negative_extents() {
        let cut = parse_cut("4, 4, -2, -1", CuttingMode::Pixels).expect("valid cut");
        assert_eq!(cut, CuttingParameters::pixels(4.0, 4.0, -2.0, -1.0));
    }

    #[test]
    fn parse_cut_rejects_wrong_arity() {
        assert!(matches!(
            parse_cut("1,2,3", CuttingMode::Percentage),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_cut("1,2,x,4", CuttingMode::Percentage),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn cli_builds_parameters() {
        let matches = build_cli().get_matches_from([
            "image-to-colors",
            "photo.png",
            "--detailing",
            "40",
            "--cut",
            "20,20,60,60",
            "--cut-mode",
            "percentage",
            "--anonymous",
        ]);

        let parameters = parameters_from_matches(&matches).expect("valid parameters");

        assert_eq!(parameters.detailing_percentage(), 40.0);
        assert_eq!(
            parameters.cutting_parameters,
            Some(CuttingParameters::percentage(20.0, 20.0, 60.0, 60.0))
        );
        assert!(parameters.cross_origin_anonymous);
    }

    #[test]
    fn cli_rejects_unknown_filter() {
        let matches = build_cli().get_matches_from(["image-to-colors", "photo.png", "--filter", "bicubic"]);

        assert!(matches!(config_from_matches(&matches), Err(AppError::Extraction(_))));
    }
}
