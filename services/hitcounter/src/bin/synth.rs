/// テンプレート合成CLI
///
/// 下流のhello関数とHitCounterを含むStackを組み立て、
/// CloudFormation形式のテンプレートを標準出力に書き出す。
///
/// ```bash
/// cargo run --bin synth -- --read-capacity 10
/// cargo run --bin synth -- --id HelloHitCounter --downstream HelloHandler --function-name hello
/// ```
use clap::Parser;
use hitcounter::domain::{FunctionProps, HitCounter, HitCounterProps, Stack};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "HitCounterを含むStackのテンプレートを出力")]
struct CliArgs {
    /// HitCounterのConstruct ID
    #[arg(long, default_value = "HelloHitCounter")]
    id: String,

    /// 下流関数の論理ID
    #[arg(long, default_value = "HelloHandler")]
    downstream: String,

    /// 下流関数の関数名
    #[arg(long, default_value = "hello")]
    function_name: String,

    /// ヒット数テーブルの読み取りキャパシティ（6〜19）
    #[arg(long, short = 'r', default_value_t = 10)]
    read_capacity: u32,
}

fn main() -> std::process::ExitCode {
    // テンプレートは標準出力に出すため、ログは標準エラーへ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match synth(&args) {
        Ok(template) => {
            println!("{}", template);
            std::process::ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "テンプレート合成失敗");
            eprintln!("{}", err);
            std::process::ExitCode::FAILURE
        }
    }
}

fn synth(args: &CliArgs) -> Result<String, Box<dyn std::error::Error>> {
    let mut stack = Stack::new();

    let downstream = stack.add_function(
        &args.downstream,
        FunctionProps::new("provided.al2023", "bootstrap", "target/lambda/hello")
            .with_function_name(&args.function_name),
    )?;

    let counter = HitCounter::new(
        &mut stack,
        &args.id,
        HitCounterProps {
            downstream,
            read_capacity: args.read_capacity,
        },
    )?;

    info!(
        handler = counter.handler().logical_id(),
        table = counter.table().logical_id(),
        "テンプレート合成"
    );

    Ok(stack.synth().to_json_pretty())
}
