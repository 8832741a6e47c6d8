//! 肝脏提取流水线的命令行入口.
//!
//! 提供两个子命令: `osrg` (单种子区域生长) 与 `msrg` (多种子区域生长).
//! 输入从 `{用户主目录}/liver/<归档>.zip` 中读取, 输出为灰度分割体积;
//! `--save-mask` 会额外保存二值掩膜.

use std::path::Path;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use rg_berry::filters;
use rg_berry::prelude::*;

#[derive(Parser)]
#[command(name = "extractor", about = "Liver Extraction", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 单种子区域生长.
    Osrg(RunArgs),

    /// 多种子区域生长.
    Msrg(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// 输入归档名 (相对于 `{用户主目录}/liver`).
    input_archive: String,

    /// 归档内的输入文件名.
    input_file: String,

    /// 输出文件名.
    output: String,

    /// 真值分割的归档名与文件名.
    #[arg(short = 'g', long = "ground-truth", num_args = 2, value_names = ["ARCHIVE", "FILE"])]
    ground_truth: Option<Vec<String>>,

    /// 在灰度分割之外, 额外保存二值掩膜.
    #[arg(long)]
    save_mask: bool,
}

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("logger 初始化失败");

    let cli = Cli::parse();
    let (args, multi) = match &cli.command {
        Command::Osrg(args) => (args, false),
        Command::Msrg(args) => (args, true),
    };

    match run(args, multi) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// 读取输入、运行所选流水线、写出结果并按需评估.
fn run(args: &RunArgs, multi: bool) -> Result<(), String> {
    info!("读取 {}:{} ...", args.input_archive, args.input_file);
    let input = zipped_volume(&args.input_archive, &args.input_file)
        .map_err(|e| format!("读取输入体积失败: {e:?}"))?;

    info!("第一阶段: 单种子区域生长...");
    let first = one_seed::run(&input);
    info!(
        "种子切片 {}, 质心 {:?}",
        first.seed_slice, first.centroid
    );

    let (volume, mask) = if multi {
        info!("第二阶段: 多种子区域生长...");
        let second = multi_seed::run(&input, &first);
        (second.volume, second.mask)
    } else {
        let volume = filters::mask_filter(&input, &first.mask);
        (volume, first.mask)
    };

    volume
        .save(&args.output)
        .map_err(|e| format!("写出分割体积失败: {e:?}"))?;
    info!("分割体积已写出到 {}", args.output);

    if args.save_mask {
        let mask_name = binary_output_name(&args.output);
        mask.save(&mask_name)
            .map_err(|e| format!("写出二值掩膜失败: {e:?}"))?;
        info!("二值掩膜已写出到 {mask_name}");
    }

    if let Some(gt) = &args.ground_truth {
        let [gt_archive, gt_file] = gt.as_slice() else {
            unreachable!("clap 保证恰有两个参数")
        };
        info!("读取真值 {gt_archive}:{gt_file} ...");
        let gt = zipped_mask(gt_archive, gt_file)
            .map_err(|e| format!("读取真值失败: {e:?}"))?;
        let ev = evaluate(&mask, &gt).map_err(|e| format!("评估失败: {e:?}"))?;
        info!("{ev}");
    }

    Ok(())
}

/// 在输出文件名的扩展名之前插入 `_binary`.
///
/// 以首个 `.` 为扩展名分界, 以兼容 `.nii.gz` 这类双重扩展名.
/// 无扩展名时直接追加后缀.
fn binary_output_name(output: &str) -> String {
    let path = Path::new(output);
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return format!("{output}_binary"),
    };

    let renamed = match file_name.split_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_binary.{ext}"),
        _ => format!("{file_name}_binary"),
    };
    path.with_file_name(renamed).to_string_lossy().into_owned()
}
