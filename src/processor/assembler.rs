//! 批次组装
//!
//! 合并剩余的明细按 (项目, 版本) 归为一个个主题，装进该任务本轮
//! 唯一的消息组。主题按首次出现顺序排列，主题内明细按入库时间
//! 升序。没有明细就没有消息组，空组永远不会产生。

use crate::model::{DetailedNotificationContent, DistributionJob, MessageContentGroup, MessageTopic};

/// 组装一个任务本轮的消息组
pub fn assemble(
    job: &DistributionJob,
    details: Vec<DetailedNotificationContent>,
) -> Option<MessageContentGroup> {
    if details.is_empty() {
        return None;
    }

    let mut topics: Vec<MessageTopic> = Vec::new();
    for detail in details {
        let existing = topics.iter_mut().find(|t| {
            t.project_name == detail.project_name
                && t.project_version_name == detail.project_version_name
        });
        match existing {
            Some(topic) => topic.details.push(detail),
            None => {
                let topic = MessageTopic::new(
                    detail.project_name.clone(),
                    detail.project_version_name.clone(),
                );
                topics.push(topic.with_details(vec![detail]));
            }
        }
    }

    for topic in &mut topics {
        topic
            .details
            .sort_by_key(|d| (d.created_at, d.source_notification_id));
    }

    Some(MessageContentGroup::new(job).with_topics(topics))
}
