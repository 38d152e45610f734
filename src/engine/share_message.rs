// ==========================================
// BrightEat 团餐拼单系统 - 分享文案
// ==========================================
// 职责: 生成拼单分享消息与加入链接（纯展示,不涉及状态机）
// 文案经 rust-i18n 本地化
// ==========================================

use crate::i18n::t_for;
use chrono::NaiveDateTime;

/// 截单时间显示格式 (例如 "01:30 PM")
pub const CUTOFF_FORMAT: &str = "%I:%M %p";

// ==========================================
// ShareContext - 分享文案输入
// ==========================================
#[derive(Debug, Clone)]
pub struct ShareContext<'a> {
    pub restaurant_name: &'a str,
    pub code: &'a str,
    pub cutoff_time: Option<NaiveDateTime>,
    pub collector_name: &'a str,
    pub assigned_usernames: &'a [String],
    pub frontend_url: Option<&'a str>,
}

/// 加入链接
///
/// 配置了前端地址时为 `{frontend_url}/join/{code}`,否则为相对路径 `/join/{code}`
pub fn join_url(frontend_url: Option<&str>, code: &str) -> String {
    match frontend_url.map(|u| u.trim().trim_end_matches('/')) {
        Some(base) if !base.is_empty() => format!("{}/join/{}", base, code),
        _ => format!("/join/{}", code),
    }
}

/// 生成分享消息
pub fn build(ctx: &ShareContext<'_>, locale: &str) -> String {
    let cutoff = match ctx.cutoff_time {
        Some(ts) => ts.format(CUTOFF_FORMAT).to_string(),
        None => t_for(locale, "share.cutoff_none", &[]),
    };
    let url = join_url(ctx.frontend_url, ctx.code);

    let mut lines = vec![
        t_for(locale, "share.header", &[("restaurant", ctx.restaurant_name)]),
        t_for(locale, "share.join_code", &[("code", ctx.code)]),
        t_for(locale, "share.cutoff", &[("cutoff", &cutoff)]),
        t_for(locale, "share.join_url", &[("url", &url)]),
        t_for(locale, "share.collector", &[("collector", ctx.collector_name)]),
    ];

    if !ctx.assigned_usernames.is_empty() {
        let names = ctx.assigned_usernames.join(", ");
        lines.push(t_for(locale, "share.assigned", &[("names", &names)]));
    }

    lines.join("\n")
}
