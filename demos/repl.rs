use schemer::{is_balanced, EvaluationContext};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>, prompt: &str) -> io::Result<Option<String>> {
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut context = EvaluationContext::new();
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { "> " } else { ". " };
        let Some(line) = query(&mut stdout, &mut lines, prompt).await? else { break };

        pending.push_str(&line);
        pending.push('\n');
        if let Ok(false) = is_balanced(&pending) {
            continue;
        }

        match context.evaluate_str(&std::mem::take(&mut pending)) {
            Ok(values) => println!("{}", EvaluationContext::render(&values)),
            Err(err) => println!("Error: {}", err),
        }
    }

    Ok(())
}
