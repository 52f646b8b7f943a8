//! 通用重试

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::warn;

/// 最多执行 `max_retries` 次 `op`，失败之间等待 `delay`
///
/// 返回第一次成功的结果，全部失败时返回最后一次的错误。
pub async fn with_retries<T, F, Fut>(
    label: &str,
    max_retries: usize,
    delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = max_retries.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_retries => return Err(e),
            Err(e) => {
                warn!("{} 第 {}/{} 次尝试失败: {}", label, attempt, max_retries, e);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_first_success() {
        let result = with_retries("测试", 3, Duration::from_millis(1), |attempt| async move {
            if attempt < 2 {
                anyhow::bail!("attempt {} failed", attempt);
            }
            Ok(attempt)
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let mut seen = Vec::new();
        let result: Result<()> = with_retries("测试", 3, Duration::from_millis(1), |attempt| {
            seen.push(attempt);
            async move { Err(anyhow::anyhow!("attempt {} failed", attempt)) }
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "attempt 3 failed");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_zero_retries_still_runs_once() {
        let no_delay = Duration::ZERO;
        let result = with_retries("测试", 0, no_delay, |attempt| async move { Ok(attempt) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
