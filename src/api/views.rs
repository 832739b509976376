//! Serializable views of store records. Everything the wire sees goes
//! through one of these; secret fields have no representation here.

use serde::Serialize;

use crate::db::{
    ChannelVideo, CommentWithOwner, LikedVideo, OwnerSummary, Playlist, PlaylistDetail,
    PlaylistPrivacy, PlaylistSummary, PlaylistVideo, SubscriptionEntry, TweetWithMeta, User,
    VideoDetail, VideoListItem, WatchEntry,
};

/// Public profile of the current or created user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.uuid,
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            created_at: user.created_at,
        }
    }
}

/// Minimal owner profile embedded in owned resources.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerView {
    pub id: String,
    pub username: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
}

impl From<OwnerSummary> for OwnerView {
    fn from(o: OwnerSummary) -> Self {
        Self {
            id: o.uuid,
            username: o.username,
            fullname: o.fullname,
            avatar_url: o.avatar_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
    pub owner: OwnerView,
}

impl From<VideoListItem> for VideoView {
    fn from(v: VideoListItem) -> Self {
        Self {
            id: v.uuid,
            title: v.title,
            description: v.description,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            duration: v.duration,
            views: v.views,
            published: v.published,
            created_at: v.created_at,
            owner: v.owner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerView,
    pub likes_count: i64,
    pub is_liked: bool,
}

impl From<VideoDetail> for VideoDetailView {
    fn from(d: VideoDetail) -> Self {
        Self {
            id: d.video.uuid,
            title: d.video.title,
            description: d.video.description,
            video_url: d.video.video_url,
            thumbnail_url: d.video.thumbnail_url,
            duration: d.video.duration,
            views: d.video.views,
            published: d.video.published,
            created_at: d.video.created_at,
            updated_at: d.video.updated_at,
            owner: d.owner.into(),
            likes_count: d.likes_count,
            is_liked: d.is_liked,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerView,
}

impl From<CommentWithOwner> for CommentView {
    fn from(c: CommentWithOwner) -> Self {
        Self {
            id: c.uuid,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
            owner: c.owner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerView,
    pub likes_count: i64,
    pub is_liked: bool,
}

impl From<TweetWithMeta> for TweetView {
    fn from(t: TweetWithMeta) -> Self {
        Self {
            id: t.uuid,
            content: t.content,
            created_at: t.created_at,
            updated_at: t.updated_at,
            owner: t.owner.into(),
            likes_count: t.likes_count,
            is_liked: t.is_liked,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub privacy: PlaylistPrivacy,
    pub views: i64,
    pub video_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerView,
}

impl From<PlaylistSummary> for PlaylistView {
    fn from(p: PlaylistSummary) -> Self {
        Self {
            id: p.uuid,
            title: p.title,
            description: p.description,
            privacy: p.privacy,
            views: p.views,
            video_count: p.video_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
            owner: p.owner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideoView {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: String,
    pub owner: OwnerView,
}

impl From<PlaylistVideo> for PlaylistVideoView {
    fn from(v: PlaylistVideo) -> Self {
        Self {
            id: v.uuid,
            title: v.title,
            thumbnail_url: v.thumbnail_url,
            duration: v.duration,
            views: v.views,
            created_at: v.created_at,
            owner: v.owner.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub privacy: PlaylistPrivacy,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerView,
    pub videos: Vec<PlaylistVideoView>,
    pub total_videos: i64,
    pub total_duration: f64,
}

impl From<PlaylistDetail> for PlaylistDetailView {
    fn from(d: PlaylistDetail) -> Self {
        let Playlist {
            uuid,
            title,
            description,
            privacy,
            views,
            created_at,
            updated_at,
            ..
        } = d.playlist;
        Self {
            id: uuid,
            title,
            description,
            privacy,
            views,
            created_at,
            updated_at,
            owner: d.owner.into(),
            videos: d.videos.into_iter().map(Into::into).collect(),
            total_videos: d.total_videos,
            total_duration: d.total_duration,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub subscribed_at: String,
    pub user: OwnerView,
}

impl From<SubscriptionEntry> for SubscriptionView {
    fn from(e: SubscriptionEntry) -> Self {
        Self {
            subscribed_at: e.subscribed_at,
            user: e.user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntryView {
    pub watched_at: String,
    pub video: VideoView,
}

impl From<WatchEntry> for WatchEntryView {
    fn from(e: WatchEntry) -> Self {
        Self {
            watched_at: e.watched_at,
            video: e.video.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoView {
    pub liked_at: String,
    pub video: VideoView,
}

impl From<LikedVideo> for LikedVideoView {
    fn from(l: LikedVideo) -> Self {
        Self {
            liked_at: l.liked_at,
            video: l.video.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideoView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub engagement: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ChannelVideo> for ChannelVideoView {
    fn from(v: ChannelVideo) -> Self {
        Self {
            id: v.uuid,
            title: v.title,
            description: v.description,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            duration: v.duration,
            views: v.views,
            engagement: v.likes_count + v.comments_count,
            likes_count: v.likes_count,
            comments_count: v.comments_count,
            published: v.published,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}
