use crate::model::candidate::IceCandidatePayload;
use crate::model::signaling::{SdpType, SessionDescription};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

impl SessionDescription {
    /// Parse into the transport's description type. Fails if the SDP text
    /// does not parse.
    pub fn to_rtc(&self) -> Result<RTCSessionDescription, webrtc::Error> {
        match self.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(self.sdp.clone()),
            SdpType::Answer => RTCSessionDescription::answer(self.sdp.clone()),
        }
    }

    /// `None` for description kinds the room record has no slot for
    /// (pranswer, rollback).
    pub fn from_rtc(desc: &RTCSessionDescription) -> Option<Self> {
        let sdp_type = match desc.sdp_type {
            RTCSdpType::Offer => SdpType::Offer,
            RTCSdpType::Answer => SdpType::Answer,
            _ => return None,
        };
        Some(Self {
            sdp_type,
            sdp: desc.sdp.clone(),
        })
    }
}

impl From<RTCIceCandidateInit> for IceCandidatePayload {
    fn from(init: RTCIceCandidateInit) -> Self {
        Self {
            candidate: init.candidate,
            sdp_mid: init.sdp_mid,
            sdp_m_line_index: init.sdp_mline_index,
            username_fragment: init.username_fragment,
        }
    }
}

impl From<IceCandidatePayload> for RTCIceCandidateInit {
    fn from(payload: IceCandidatePayload) -> Self {
        Self {
            candidate: payload.candidate,
            sdp_mid: payload.sdp_mid,
            sdp_mline_index: payload.sdp_m_line_index,
            username_fragment: payload.username_fragment,
        }
    }
}
